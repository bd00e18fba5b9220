//! Host-implemented functions reachable from scripts via `OpGetBuiltin`.
//!
//! The registry is a fixed, ordered list: the compiler binds each name to
//! its position here when seeding the symbol table, and the VM dispatches
//! `OpGetBuiltin i` / calls by indexing the same list, so indices stay
//! stable between a compile and the run that consumes its bytecode.

use crate::error::RuntimeError;
use crate::vm::value::Value;

/// Names in registration order; index into this slice is the builtin's
/// symbol-table index.
pub const NAMES: &[&str] = &["len", "print"];

pub fn call(index: usize, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match NAMES.get(index) {
        Some(&"len") => len(args),
        Some(&"print") => print(args),
        _ => Err(RuntimeError::general(format!("unknown builtin index {index}"))),
    }
}

fn len(mut args: Vec<Value>) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::WrongArgumentCount { want: 1, got: args.len() });
    }
    match args.pop().unwrap() {
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        Value::String(s) => Ok(Value::Integer(s.len() as i64)),
        other => Err(RuntimeError::general(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        ))),
    }
}

fn print(args: Vec<Value>) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::WrongArgumentCount { want: 1, got: args.len() });
    }
    println!("{}", args[0].inspect());
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn len_reports_array_length() {
        let arr = Value::Array(Rc::new(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(len(vec![arr]).unwrap(), Value::Integer(2));
    }

    #[test]
    fn len_reports_string_byte_length() {
        assert_eq!(len(vec![Value::string("hello")]).unwrap(), Value::Integer(5));
    }

    #[test]
    fn len_rejects_unsupported_types() {
        assert!(len(vec![Value::Integer(1)]).is_err());
    }

    #[test]
    fn names_are_resolved_by_call_index() {
        assert_eq!(NAMES[0], "len");
        assert_eq!(NAMES[1], "print");
    }
}
