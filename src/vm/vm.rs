//! The fetch-decode-execute loop.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::RuntimeError;

use super::compiler::Bytecode;
use super::frame::{Frame, Stack};
use super::opcode::{read_u16, read_u8, OpCode};
use super::value::{Closure, CompiledFunction, HashKey, Value};

pub struct Vm {
    constants: Vec<Value>,
    stack: Stack,
    globals: Vec<Value>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        let main_fn = Rc::new(CompiledFunction {
            instructions: Rc::new(bytecode.instructions),
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(Closure { func: main_fn, free: Rc::new(Vec::new()) });
        let mut stack = Stack::new();
        stack.push_frame(Frame::new(main_closure, 0)).expect("first frame always fits");

        Self { constants: bytecode.constants, stack, globals: Vec::new() }
    }

    /// Build a VM that resumes with a prior run's global bindings — used by
    /// the REPL to keep `let`-bound globals live across lines.
    pub fn new_with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let mut vm = Self::new(bytecode);
        vm.globals = globals;
        vm
    }

    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The most recently popped value — the conventional program result.
    pub fn last_popped(&self) -> &Value {
        self.stack.last_popped()
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            let (ip, ins_len) = {
                let frame = self.stack.current_frame();
                (frame.ip, frame.instructions().len())
            };
            if ip >= ins_len as isize - 1 {
                if self.stack.frames.len() == 1 {
                    return Ok(());
                }
                // A nested frame ran off its own instructions without an
                // explicit return; treat it as an implicit `OpReturn`.
                self.do_return(Value::Null)?;
                continue;
            }

            let ip = ip + 1;
            self.stack.current_frame().ip = ip;
            let op_byte = self.stack.current_frame().instructions()[ip as usize];
            let Some(op) = OpCode::from_u8(op_byte) else {
                return Err(RuntimeError::general(format!("unknown opcode byte {op_byte}")));
            };

            match op {
                OpCode::Constant => {
                    let idx = self.read_u16_operand();
                    let value = self
                        .constants
                        .get(idx as usize)
                        .cloned()
                        .ok_or(RuntimeError::BadConstantIndex(idx))?;
                    self.stack.push(value)?;
                }
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    let right = self.stack.pop();
                    let left = self.stack.pop();
                    let result = Self::execute_binary_op(op, left, right)?;
                    self.stack.push(result)?;
                }
                OpCode::Minus => {
                    let value = self.stack.pop();
                    let result = match value {
                        Value::Integer(n) => Value::Integer(-n),
                        Value::Float(n) => Value::Float(-n),
                        other => {
                            return Err(RuntimeError::UnsupportedUnaryType(
                                "-".to_string(),
                                other.type_name().to_string(),
                            ))
                        }
                    };
                    self.stack.push(result)?;
                }
                OpCode::Bang => {
                    let value = self.stack.pop();
                    self.stack.push(Value::Bool(!value.is_truthy()))?;
                }
                OpCode::True => self.stack.push(Value::Bool(true))?,
                OpCode::False => self.stack.push(Value::Bool(false))?,
                OpCode::Null => self.stack.push(Value::Null)?,
                OpCode::Equal | OpCode::NotEqual | OpCode::GreaterThan | OpCode::GreaterThanEqual => {
                    let right = self.stack.pop();
                    let left = self.stack.pop();
                    let result = Self::execute_comparison(op, left, right)?;
                    self.stack.push(Value::Bool(result))?;
                }
                OpCode::Pop => {
                    self.stack.pop();
                }
                OpCode::Jump => {
                    let target = read_u16(self.stack.current_frame().instructions(), (ip + 1) as usize);
                    self.stack.current_frame().ip = target as isize - 1;
                }
                OpCode::JumpNotTruthy => {
                    let target = read_u16(self.stack.current_frame().instructions(), (ip + 1) as usize);
                    self.stack.current_frame().ip += 2;
                    let condition = self.stack.pop();
                    if !condition.is_truthy() {
                        self.stack.current_frame().ip = target as isize - 1;
                    }
                }
                OpCode::Loop => {
                    let offset = read_u16(self.stack.current_frame().instructions(), (ip + 1) as usize);
                    self.stack.current_frame().ip -= offset as isize;
                }
                OpCode::GetGlobal => {
                    let idx = self.read_u16_operand() as usize;
                    let value = self.globals.get(idx).cloned().unwrap_or(Value::Null);
                    self.stack.push(value)?;
                }
                OpCode::SetGlobal => {
                    let idx = self.read_u16_operand() as usize;
                    let value = self.stack.pop();
                    if idx >= self.globals.len() {
                        self.globals.resize(idx + 1, Value::Null);
                    }
                    self.globals[idx] = value;
                }
                OpCode::GetLocal => {
                    let slot = self.read_u8_operand() as usize;
                    let base = self.stack.current_frame().base_pointer;
                    self.stack.push(self.stack.values[base + slot].clone())?;
                }
                OpCode::SetLocal => {
                    let slot = self.read_u8_operand() as usize;
                    let base = self.stack.current_frame().base_pointer;
                    let value = self.stack.pop();
                    self.stack.values[base + slot] = value;
                }
                OpCode::GetBuiltin => {
                    let idx = self.read_u8_operand() as usize;
                    self.stack.push(Value::Builtin(super::value::BuiltinHandle(idx)))?;
                }
                OpCode::GetFree => {
                    let idx = self.read_u8_operand() as usize;
                    let value = self.stack.current_frame().closure.free[idx].clone();
                    self.stack.push(value)?;
                }
                OpCode::CurrentClosure => {
                    let closure = self.stack.current_frame().closure.clone();
                    self.stack.push(Value::Closure(closure))?;
                }
                OpCode::Array => {
                    let n = self.read_u16_operand() as usize;
                    let start = self.stack.sp - n;
                    let items = self.stack.values[start..self.stack.sp].to_vec();
                    self.stack.sp = start;
                    self.stack.push(Value::Array(Rc::new(items)))?;
                }
                OpCode::Hash => {
                    let n = self.read_u16_operand() as usize;
                    let start = self.stack.sp - n;
                    let pairs = self.stack.values[start..self.stack.sp].to_vec();
                    self.stack.sp = start;
                    let mut map = IndexMap::new();
                    for chunk in pairs.chunks(2) {
                        let (key, value) = (chunk[0].clone(), chunk[1].clone());
                        let hash_key = HashKey::from_value(&key)
                            .ok_or_else(|| RuntimeError::UnusableHashKey(key.type_name().to_string()))?;
                        map.insert(hash_key, (key, value));
                    }
                    self.stack.push(Value::Map(Rc::new(map)))?;
                }
                OpCode::Index => {
                    let index = self.stack.pop();
                    let container = self.stack.pop();
                    let result = Self::execute_index(container, index)?;
                    self.stack.push(result)?;
                }
                OpCode::Call => {
                    let argc = self.read_u8_operand() as usize;
                    self.execute_call(argc)?;
                }
                OpCode::ReturnValue => {
                    let value = self.stack.pop();
                    self.do_return(value)?;
                }
                OpCode::Return => {
                    self.do_return(Value::Null)?;
                }
                OpCode::Closure => {
                    let const_idx = self.read_u16_operand();
                    let num_free = self.read_u8_operand() as usize;
                    let func = match self.constants.get(const_idx as usize) {
                        Some(Value::CompiledFunction(func)) => func.clone(),
                        _ => return Err(RuntimeError::BadConstantIndex(const_idx)),
                    };
                    let start = self.stack.sp - num_free;
                    let free = self.stack.values[start..self.stack.sp].to_vec();
                    self.stack.sp = start;
                    self.stack.push(Value::Closure(Rc::new(Closure { func, free: Rc::new(free) })))?;
                }
            }
        }
    }

    fn read_u16_operand(&mut self) -> u16 {
        let frame = self.stack.current_frame();
        let value = read_u16(frame.instructions(), (frame.ip + 1) as usize);
        frame.ip += 2;
        value
    }

    fn read_u8_operand(&mut self) -> u8 {
        let frame = self.stack.current_frame();
        let value = read_u8(frame.instructions(), (frame.ip + 1) as usize);
        frame.ip += 1;
        value
    }

    fn do_return(&mut self, value: Value) -> Result<(), RuntimeError> {
        let frame = self.stack.pop_frame();
        self.stack.sp = frame.base_pointer - 1;
        self.stack.push(value)
    }

    fn execute_call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee_idx = self.stack.sp - 1 - argc;
        match self.stack.values[callee_idx].clone() {
            Value::Closure(closure) => {
                if argc != closure.func.num_parameters {
                    return Err(RuntimeError::WrongArgumentCount {
                        want: closure.func.num_parameters,
                        got: argc,
                    });
                }
                let num_locals = closure.func.num_locals;
                let base_pointer = self.stack.sp - argc;
                self.stack.push_frame(Frame::new(closure, base_pointer))?;
                self.stack.sp = base_pointer + num_locals;
                Ok(())
            }
            Value::Builtin(handle) => {
                let args = self.stack.values[self.stack.sp - argc..self.stack.sp].to_vec();
                let result = crate::builtins::call(handle.0, args)?;
                self.stack.sp -= argc + 1;
                self.stack.push(result)
            }
            _ => Err(RuntimeError::NotCallable),
        }
    }

    fn execute_binary_op(op: OpCode, left: Value, right: Value) -> Result<Value, RuntimeError> {
        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => Self::integer_binary_op(op, *a, *b),
            (Value::String(a), Value::String(b)) if op == OpCode::Add => {
                Ok(Value::string(format!("{a}{b}")))
            }
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                let a = Self::as_f64(&left);
                let b = Self::as_f64(&right);
                Self::float_binary_op(op, a, b)
            }
            _ => Err(RuntimeError::UnsupportedBinaryTypes(
                left.type_name().to_string(),
                right.type_name().to_string(),
            )),
        }
    }

    /// Truncating integer division; promotes to `Float` only when an
    /// operand already is one (see integer-division policy in the design
    /// notes).
    fn integer_binary_op(op: OpCode, a: i64, b: i64) -> Result<Value, RuntimeError> {
        let result = match op {
            OpCode::Add => a + b,
            OpCode::Sub => a - b,
            OpCode::Mul => a * b,
            OpCode::Div => {
                if b == 0 {
                    return Err(RuntimeError::general("division by zero"));
                }
                a / b
            }
            _ => unreachable!("non-arithmetic opcode passed to integer_binary_op"),
        };
        Ok(Value::Integer(result))
    }

    fn float_binary_op(op: OpCode, a: f64, b: f64) -> Result<Value, RuntimeError> {
        let result = match op {
            OpCode::Add => a + b,
            OpCode::Sub => a - b,
            OpCode::Mul => a * b,
            OpCode::Div => a / b,
            _ => unreachable!("non-arithmetic opcode passed to float_binary_op"),
        };
        Ok(Value::Float(result))
    }

    fn as_f64(value: &Value) -> f64 {
        match value {
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            _ => unreachable!("as_f64 called on a non-numeric value"),
        }
    }

    fn execute_comparison(op: OpCode, left: Value, right: Value) -> Result<bool, RuntimeError> {
        let numeric = matches!(left, Value::Integer(_) | Value::Float(_))
            && matches!(right, Value::Integer(_) | Value::Float(_));

        if numeric {
            let a = Self::as_f64(&left);
            let b = Self::as_f64(&right);
            return Ok(match op {
                OpCode::Equal => a == b,
                OpCode::NotEqual => a != b,
                OpCode::GreaterThan => a > b,
                OpCode::GreaterThanEqual => a >= b,
                _ => unreachable!("non-comparison opcode"),
            });
        }

        match op {
            OpCode::Equal => Ok(left == right),
            OpCode::NotEqual => Ok(left != right),
            _ => Err(RuntimeError::UnknownComparison),
        }
    }

    fn execute_index(container: Value, index: Value) -> Result<Value, RuntimeError> {
        match (&container, &index) {
            (Value::Array(items), Value::Integer(i)) => {
                if *i < 0 || *i as usize >= items.len() {
                    Ok(Value::Null)
                } else {
                    Ok(items[*i as usize].clone())
                }
            }
            (Value::Map(entries), _) => {
                let Some(key) = HashKey::from_value(&index) else {
                    return Err(RuntimeError::UnusableHashKey(index.type_name().to_string()));
                };
                Ok(entries.get(&key).map(|(_, v)| v.clone()).unwrap_or(Value::Null))
            }
            _ => Err(RuntimeError::IndexNotSupported(container.type_name().to_string())),
        }
    }
}
