//! Rivet CLI: run a script file, disassemble one, or start the REPL.

use std::path::Path;
use std::process;

use colored::Colorize;

use rivet::error::RivetError;
use rivet::lexer::Scanner;
use rivet::parser::Parser;
use rivet::repl::Repl;
use rivet::vm::{disassemble, Compiler};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match args.as_slice() {
        [] => {
            Repl::new().run();
            Ok(())
        }
        [flag, path] if flag == "-d" => disassemble_file(path),
        [path] => run_file(path),
        _ => {
            eprintln!("usage: rivet [-d] [file]");
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("{}", format!("{e}").red());
        process::exit(1);
    }
}

fn run_file(path: &str) -> Result<(), RivetError> {
    rivet::run_file(Path::new(path))?;
    Ok(())
}

fn disassemble_file(path: &str) -> Result<(), RivetError> {
    let source = std::fs::read_to_string(path)?;
    let tokens = Scanner::new(&source).scan_tokens()?;
    let program = Parser::new(tokens).parse_program()?;
    let bytecode = Compiler::new().compile_program(&program)?;
    print!("{}", disassemble(&bytecode.instructions));
    Ok(())
}
