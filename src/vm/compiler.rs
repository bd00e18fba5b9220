//! AST -> bytecode lowering: manages compilation scopes, the constant pool,
//! and jump patching. Expression- and statement-specific lowering live in
//! `compiler_exprs` and `compiler_stmts`.

use std::rc::Rc;

use crate::ast::Program;
use crate::error::CompileError;

use super::opcode::{make, OpCode};
use super::symbol_table::SymbolTable;
use super::value::{CompiledFunction, Value};

pub type CompileResult<T> = Result<T, CompileError>;

/// The last two instructions emitted in a scope, tracked so an `if`/function
/// tail can strip a trailing `OpPop` without re-scanning the buffer.
#[derive(Debug, Clone, Copy)]
pub struct EmittedInstruction {
    pub opcode: OpCode,
    pub position: usize,
}

struct CompilationScope {
    instructions: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl CompilationScope {
    fn new() -> Self {
        Self {
            instructions: Vec::new(),
            last_instruction: None,
            previous_instruction: None,
        }
    }
}

/// The bytecode produced for a whole program: the top-level instructions
/// plus every constant referenced from anywhere in the program.
pub struct Bytecode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Value>,
}

pub struct Compiler {
    constants: Vec<Value>,
    scopes: Vec<CompilationScope>,
    symbol_table: SymbolTable,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, name) in crate::builtins::NAMES.iter().enumerate() {
            symbol_table.define_builtin(index, name);
        }
        Self {
            constants: Vec::new(),
            scopes: vec![CompilationScope::new()],
            symbol_table,
        }
    }

    /// Build a compiler that resumes from a prior run's symbol table and
    /// constant pool — used by the REPL to keep bindings live across lines.
    pub fn new_with_state(constants: Vec<Value>, symbol_table: SymbolTable) -> Self {
        Self { constants, scopes: vec![CompilationScope::new()], symbol_table }
    }

    pub fn compile_program(mut self, program: &Program) -> CompileResult<Bytecode> {
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        let instructions = self.scopes.pop().expect("outermost scope present").instructions;
        Ok(Bytecode { instructions, constants: self.constants })
    }

    /// Like [`Compiler::compile_program`] but also hands back the symbol
    /// table, so the caller can resume compilation on the next input.
    pub fn compile_for_repl(mut self, program: &Program) -> CompileResult<(Bytecode, SymbolTable)> {
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        let instructions = self.scopes.pop().expect("outermost scope present").instructions;
        Ok((Bytecode { instructions, constants: self.constants }, self.symbol_table))
    }

    // --- Emission helpers -------------------------------------------------

    pub(super) fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let position = make(&mut self.scope_mut().instructions, op, operands);
        self.set_last_instruction(op, position);
        position
    }

    fn set_last_instruction(&mut self, opcode: OpCode, position: usize) {
        let scope = self.scope_mut();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    pub(super) fn last_instruction_is(&self, opcode: OpCode) -> bool {
        matches!(self.scope().last_instruction, Some(ins) if ins.opcode == opcode)
    }

    /// Remove the last emitted instruction (used to strip a trailing `OpPop`
    /// from an expression-valued block).
    pub(super) fn remove_last_pop(&mut self) {
        let scope = self.scope_mut();
        let last = scope.last_instruction.expect("remove_last_pop with no last instruction");
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction;
    }

    /// Overwrite the last emitted `OpPop` with `OpReturnValue` in place
    /// (both are a single opcode byte with no operands).
    pub(super) fn replace_last_pop_with_return(&mut self) {
        let position = self.scope().last_instruction.expect("replace with no last instruction").position;
        self.scope_mut().instructions[position] = OpCode::ReturnValue.into();
        self.set_last_instruction(OpCode::ReturnValue, position);
    }

    pub(super) fn current_offset(&self) -> usize {
        self.scope().instructions.len()
    }

    pub(super) fn change_operand(&mut self, position: usize, operand: usize) {
        let op = OpCode::from_u8(self.scope().instructions[position]).expect("patch target is an opcode");
        let mut patched = Vec::new();
        make(&mut patched, op, &[operand]);
        let ins = &mut self.scope_mut().instructions;
        ins[position..position + patched.len()].copy_from_slice(&patched);
    }

    fn scope(&self) -> &CompilationScope {
        self.scopes.last().expect("at least one compilation scope")
    }

    fn scope_mut(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().expect("at least one compilation scope")
    }

    pub(super) fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    // --- Scopes -------------------------------------------------------

    pub(super) fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::push(outer);
    }

    /// Leave the current scope, returning its instructions and the
    /// enclosing symbol table's newly promoted free-variable list plus the
    /// number of local slots the function needs.
    pub(super) fn leave_scope(&mut self) -> (Vec<u8>, Vec<super::symbol_table::Symbol>, usize) {
        let scope = self.scopes.pop().expect("leave_scope with no nested scope");
        let inner_table = std::mem::take(&mut self.symbol_table);
        let num_locals = inner_table.num_definitions();
        let free = inner_table.free_symbols.clone();
        self.symbol_table = inner_table.pop();
        (scope.instructions, free, num_locals)
    }

    pub(super) fn symbol_table(&mut self) -> &mut SymbolTable {
        &mut self.symbol_table
    }

    /// Emit the opcode that pushes `symbol`'s current value per its scope.
    pub(super) fn emit_get(&mut self, symbol: &super::symbol_table::Symbol) {
        use super::symbol_table::Scope;
        match symbol.scope {
            Scope::Global => self.emit(OpCode::GetGlobal, &[symbol.index]),
            Scope::Local => self.emit(OpCode::GetLocal, &[symbol.index]),
            Scope::Builtin => self.emit(OpCode::GetBuiltin, &[symbol.index]),
            Scope::Free => self.emit(OpCode::GetFree, &[symbol.index]),
            Scope::Function => self.emit(OpCode::CurrentClosure, &[]),
        };
    }

    /// Emit the opcode that pops the top of stack into `symbol`'s slot.
    pub(super) fn emit_set(&mut self, symbol: &super::symbol_table::Symbol) -> CompileResult<()> {
        use super::symbol_table::Scope;
        match symbol.scope {
            Scope::Global => {
                self.emit(OpCode::SetGlobal, &[symbol.index]);
            }
            Scope::Local => {
                self.emit(OpCode::SetLocal, &[symbol.index]);
            }
            other => {
                return Err(CompileError::general(format!(
                    "cannot assign to a {other:?}-scoped binding"
                )))
            }
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn compiled_function(instructions: Vec<u8>, num_locals: usize, num_parameters: usize) -> Value {
    Value::CompiledFunction(Rc::new(CompiledFunction {
        instructions: Rc::new(instructions),
        num_locals,
        num_parameters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;
    use crate::vm::disassembler::disassemble;

    fn compile(source: &str) -> Bytecode {
        let tokens = Scanner::new(source).scan_tokens().expect("lex ok");
        let program = Parser::new(tokens).parse_program().expect("parse ok");
        Compiler::new().compile_program(&program).expect("compile ok")
    }

    /// Scenario 6: a let-bound recursive function resolves its own name via
    /// `OpCurrentClosure`, not an incidental global/free lookup.
    #[test]
    fn self_recursive_let_binding_emits_current_closure() {
        let source = "let fact = fn(n) { if (n < 2) { 1 } else { n * fact(n - 1) } };";
        let bytecode = compile(source);
        let func_constant = bytecode
            .constants
            .iter()
            .find_map(|c| match c {
                Value::CompiledFunction(f) => Some(f.clone()),
                _ => None,
            })
            .expect("function constant present");
        let disassembled = disassemble(&func_constant.instructions);
        assert!(
            disassembled.contains("OpCurrentClosure"),
            "expected OpCurrentClosure in:\n{disassembled}"
        );
    }

    /// `<` canonicalizes to `OpGreaterThan` with its operands swapped: the
    /// right-hand operand's constant is emitted before the left-hand one.
    #[test]
    fn less_than_canonicalizes_to_greater_than_with_swapped_operands() {
        let bytecode = compile("1 < 2;");
        assert_eq!(bytecode.constants, vec![Value::Integer(2), Value::Integer(1)]);

        let disassembled = disassemble(&bytecode.instructions);
        assert_eq!(
            disassembled,
            "0000 OpConstant 0\n0003 OpConstant 1\n0006 OpGreaterThan\n0007 OpPop\n"
        );
    }
}
