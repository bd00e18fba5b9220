//! Interactive REPL: keeps the symbol table, constant pool, and global
//! bindings alive across lines so `let` statements from one prompt are
//! visible to the next.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::RivetError;
use crate::lexer::Scanner;
use crate::parser::Parser;
use crate::vm::symbol_table::SymbolTable;
use crate::vm::value::Value;
use crate::vm::{Compiler, Vm};

const HISTORY_FILE: &str = ".rivet_history";

pub struct Repl {
    symbol_table: SymbolTable,
    constants: Vec<Value>,
    globals: Vec<Value>,
    history_file: PathBuf,
}

impl Repl {
    pub fn new() -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            constants: Vec::new(),
            globals: Vec::new(),
            history_file: Self::history_path(),
        }
    }

    fn history_path() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(HISTORY_FILE),
            None => PathBuf::from(HISTORY_FILE),
        }
    }

    pub fn run(&mut self) {
        println!("Rivet REPL");
        println!("Type an expression, or Ctrl+D to exit.\n");

        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("warning: falling back to plain stdin, no history ({e})");
                self.run_basic();
                return;
            }
        };
        let _ = editor.load_history(&self.history_file);

        loop {
            match editor.readline(">> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line);
                    self.eval_and_print(line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("readline error: {e}");
                    break;
                }
            }
        }
        let _ = editor.save_history(&self.history_file);
    }

    fn run_basic(&mut self) {
        let mut line = String::new();
        loop {
            line.clear();
            if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let line = line.trim();
            if !line.is_empty() {
                self.eval_and_print(line);
            }
        }
    }

    fn eval_and_print(&mut self, line: &str) {
        match self.eval(line) {
            Ok(value) => println!("{}", value.inspect()),
            Err(e) => eprintln!("{e}"),
        }
    }

    fn eval(&mut self, source: &str) -> Result<Value, RivetError> {
        let tokens = Scanner::new(source).scan_tokens()?;
        let program = Parser::new(tokens).parse_program()?;

        let symbol_table = std::mem::take(&mut self.symbol_table);
        let constants = std::mem::take(&mut self.constants);
        let compiler = Compiler::new_with_state(constants, symbol_table);
        let (bytecode, symbol_table) = compiler.compile_for_repl(&program)?;
        self.symbol_table = symbol_table;
        self.constants = bytecode.constants.clone();

        let globals = std::mem::take(&mut self.globals);
        let mut machine = Vm::new_with_globals(bytecode, globals);
        machine.run()?;
        let result = machine.last_popped().clone();
        self.globals = machine.into_globals();
        Ok(result)
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
