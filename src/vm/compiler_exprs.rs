//! Expression lowering.

use crate::ast::{Expr, InfixOp, PrefixOp};
use crate::error::CompileError;

use super::compiler::{compiled_function, CompileResult, Compiler};
use super::opcode::OpCode;
use super::value::Value;

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::IntegerLiteral(n) => {
                let idx = self.add_constant(Value::Integer(*n));
                self.emit(OpCode::Constant, &[idx]);
            }
            Expr::FloatLiteral(n) => {
                let idx = self.add_constant(Value::Float(*n));
                self.emit(OpCode::Constant, &[idx]);
            }
            Expr::StringLiteral(s) => {
                let idx = self.add_constant(Value::string(s.clone()));
                self.emit(OpCode::Constant, &[idx]);
            }
            Expr::BooleanLiteral(true) => {
                self.emit(OpCode::True, &[]);
            }
            Expr::BooleanLiteral(false) => {
                self.emit(OpCode::False, &[]);
            }
            Expr::NullLiteral => {
                self.emit(OpCode::Null, &[]);
            }
            Expr::IdentifierLiteral(name) => {
                let symbol = self
                    .symbol_table()
                    .resolve(name)
                    .ok_or_else(|| CompileError::undefined_variable(name.clone()))?;
                self.emit_get(&symbol);
            }
            Expr::ArrayLiteral(elements) => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(OpCode::Array, &[elements.len()]);
            }
            Expr::HashLiteral(pairs) => {
                let mut sorted: Vec<&(Expr, Expr)> = pairs.iter().collect();
                sorted.sort_by_key(|(key, _)| key.to_string());
                for (key, value) in &sorted {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(OpCode::Hash, &[pairs.len() * 2]);
            }
            Expr::Prefix { operator, right } => {
                self.compile_expr(right)?;
                match operator {
                    PrefixOp::Minus => self.emit(OpCode::Minus, &[]),
                    PrefixOp::Bang => self.emit(OpCode::Bang, &[]),
                };
            }
            Expr::Infix { left, operator, right } => {
                if matches!(operator, InfixOp::Lt) {
                    self.compile_expr(right)?;
                    self.compile_expr(left)?;
                    self.emit(OpCode::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                match operator {
                    InfixOp::Add => self.emit(OpCode::Add, &[]),
                    InfixOp::Sub => self.emit(OpCode::Sub, &[]),
                    InfixOp::Mul => self.emit(OpCode::Mul, &[]),
                    InfixOp::Div => self.emit(OpCode::Div, &[]),
                    InfixOp::Gt => self.emit(OpCode::GreaterThan, &[]),
                    InfixOp::Eq => self.emit(OpCode::Equal, &[]),
                    InfixOp::NotEq => self.emit(OpCode::NotEqual, &[]),
                    InfixOp::Lt => unreachable!("handled above"),
                };
            }
            Expr::If { condition, consequence, alternative } => {
                self.compile_expr(condition)?;
                let jump_not_truthy = self.emit(OpCode::JumpNotTruthy, &[9999]);

                for stmt in consequence {
                    self.compile_stmt(stmt)?;
                }
                if self.last_instruction_is(OpCode::Pop) {
                    self.remove_last_pop();
                }

                let jump = self.emit(OpCode::Jump, &[9999]);
                let after_consequence = self.current_offset();
                self.change_operand(jump_not_truthy, after_consequence);

                match alternative {
                    None => {
                        self.emit(OpCode::Null, &[]);
                    }
                    Some(alternative) => {
                        for stmt in alternative {
                            self.compile_stmt(stmt)?;
                        }
                        if self.last_instruction_is(OpCode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                }
                let after_alternative = self.current_offset();
                self.change_operand(jump, after_alternative);
            }
            Expr::Index { left, index } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(OpCode::Index, &[]);
            }
            Expr::Call { function, arguments } => {
                self.compile_expr(function)?;
                for argument in arguments {
                    self.compile_expr(argument)?;
                }
                self.emit(OpCode::Call, &[arguments.len()]);
            }
            Expr::FunctionLiteral { parameters, body, name } => {
                self.compile_function_literal(parameters, body, name.as_deref())?;
            }
        }
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        parameters: &[String],
        body: &[crate::ast::Stmt],
        name: Option<&str>,
    ) -> CompileResult<()> {
        self.enter_scope();

        if let Some(name) = name {
            self.symbol_table().define_function_name(name);
        }
        for parameter in parameters {
            self.symbol_table().define(parameter);
        }

        for stmt in body {
            self.compile_stmt(stmt)?;
        }
        if self.last_instruction_is(OpCode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(OpCode::ReturnValue) {
            self.emit(OpCode::Return, &[]);
        }

        let (instructions, free_symbols, num_locals) = self.leave_scope();

        for free in &free_symbols {
            self.emit_get(free);
        }

        let func = compiled_function(instructions, num_locals, parameters.len());
        let const_idx = self.add_constant(func);
        self.emit(OpCode::Closure, &[const_idx, free_symbols.len()]);
        Ok(())
    }
}
