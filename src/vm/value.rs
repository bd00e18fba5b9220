//! Runtime value model: the tagged union every stack slot and constant holds.

use std::rc::Rc;

use indexmap::IndexMap;

/// A hashable projection of a [`Value`], used as `Map` keys.
///
/// Only `Integer`, `Bool`, and `String` are hashable — `Float` is excluded
/// because NaN breaks reflexive equality, and composites have no identity
/// worth hashing in this core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Bool(bool),
    String(String),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<HashKey> {
        match value {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Bool(b) => Some(HashKey::Bool(*b)),
            Value::String(s) => Some(HashKey::String((**s).clone())),
            _ => None,
        }
    }
}

/// A compiled function: instructions plus the frame shape the VM needs to
/// call it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Rc<Vec<u8>>,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function bound to the values of its free variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Rc<Vec<Value>>,
}

/// A host-implemented function, identified by its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinHandle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    String(Rc<String>),
    Array(Rc<Vec<Value>>),
    Map(Rc<IndexMap<HashKey, (Value, Value)>>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(BuiltinHandle),
    /// A runtime failure marker. Never constructed by this core's opcode
    /// set — errors halt execution instead of producing a value — but kept
    /// as a variant since builtins are free to return one.
    Error(Rc<String>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Rc::new(s.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Null => "Null",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::CompiledFunction(_) => "CompiledFunction",
            Value::Closure(_) => "Closure",
            Value::Builtin(_) => "Builtin",
            Value::Error(_) => "Error",
        }
    }

    /// `false` and `null` are falsey; everything else, including `0` and
    /// empty collections, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    /// Human-readable rendering used by the `print` builtin and the REPL.
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::String(s) => (**s).clone(),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(entries) => {
                let rendered: Vec<String> = entries
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::CompiledFunction(_) => "CompiledFunction".to_string(),
            Value::Closure(_) => "Closure".to_string(),
            Value::Builtin(_) => "builtin function".to_string(),
            Value::Error(msg) => format!("ERROR: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_integer_bool_string_are_hashable() {
        assert_eq!(HashKey::from_value(&Value::Integer(3)), Some(HashKey::Integer(3)));
        assert_eq!(HashKey::from_value(&Value::Bool(true)), Some(HashKey::Bool(true)));
        assert_eq!(
            HashKey::from_value(&Value::string("x")),
            Some(HashKey::String("x".to_string()))
        );
        assert_eq!(HashKey::from_value(&Value::Float(1.0)), None);
        assert_eq!(HashKey::from_value(&Value::Array(Rc::new(vec![]))), None);
    }

    #[test]
    fn truthiness_excludes_only_false_and_null() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Array(Rc::new(vec![])).is_truthy());
    }

    #[test]
    fn inspect_renders_nested_arrays() {
        let arr = Value::Array(Rc::new(vec![Value::Integer(1), Value::string("a")]));
        assert_eq!(arr.inspect(), "[1, a]");
    }
}
