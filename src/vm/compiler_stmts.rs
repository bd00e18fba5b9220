//! Statement lowering.

use crate::ast::Stmt;
use crate::error::CompileError;
use crate::lexer::Scanner;
use crate::parser::Parser;

use super::compiler::{CompileResult, Compiler};
use super::opcode::OpCode;

impl Compiler {
    pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::ExpressionStatement(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, &[]);
            }
            Stmt::BlockStatement(statements) => {
                for stmt in statements {
                    self.compile_stmt(stmt)?;
                }
            }
            Stmt::LetStatement { name, value } => {
                let symbol = self.symbol_table().define(name);
                self.compile_expr(value)?;
                self.emit_set(&symbol)?;
            }
            Stmt::AssignStatement { ident, right_value } => {
                let symbol = self
                    .symbol_table()
                    .resolve(ident)
                    .ok_or_else(|| CompileError::undefined_variable(ident.clone()))?;
                self.compile_expr(right_value)?;
                self.emit_set(&symbol)?;
            }
            Stmt::ReturnStatement(value) => {
                self.compile_expr(value)?;
                self.emit(OpCode::ReturnValue, &[]);
            }
            Stmt::WhileStatement { condition, body } => {
                let loop_start = self.current_offset();
                self.compile_expr(condition)?;
                let jump_not_truthy = self.emit(OpCode::JumpNotTruthy, &[9999]);

                for stmt in body {
                    self.compile_stmt(stmt)?;
                }

                self.emit(OpCode::Loop, &[self.current_offset() - loop_start + 1]);
                let after = self.current_offset();
                self.change_operand(jump_not_truthy, after);
            }
            Stmt::ForStatement { initializer, condition, increment, body } => {
                self.compile_stmt(initializer)?;
                let cond_start = self.current_offset();
                self.compile_expr(condition)?;
                let jump_not_truthy = self.emit(OpCode::JumpNotTruthy, &[9999]);

                self.compile_stmt(increment)?;
                for stmt in body {
                    self.compile_stmt(stmt)?;
                }

                self.emit(OpCode::Loop, &[self.current_offset() - cond_start + 1]);
                let after = self.current_offset();
                self.change_operand(jump_not_truthy, after);
            }
            Stmt::ImportStatement { file_path } => {
                self.compile_import(file_path)?;
            }
        }
        Ok(())
    }

    fn compile_import(&mut self, file_path: &str) -> CompileResult<()> {
        let source = std::fs::read_to_string(file_path)
            .map_err(|e| CompileError::ImportFailed(file_path.to_string(), e.to_string()))?;
        let tokens = Scanner::new(&source)
            .scan_tokens()
            .map_err(|e| CompileError::ImportFailed(file_path.to_string(), e.to_string()))?;
        let program = Parser::new(tokens)
            .parse_program()
            .map_err(|e| CompileError::ImportFailed(file_path.to_string(), e.to_string()))?;
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }
}
