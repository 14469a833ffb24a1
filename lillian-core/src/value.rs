//! Runtime values.

use std::fmt;
use std::rc::Rc;

use crate::error::CoreError;

/// Anything that can be called with an ordered list of evaluated
/// arguments. Closures and builtins both implement this; the core never
/// inspects argument counts or types on their behalf.
pub trait Invokable: fmt::Debug {
    fn invoke(&self, args: Vec<Value>) -> Result<Value, CoreError>;

    /// Short description used when the value is displayed.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
    Function(Rc<dyn Invokable>),
}

impl Value {
    pub fn string(text: impl Into<Rc<str>>) -> Value {
        Value::Str(text.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_function(&self) -> Option<&Rc<dyn Invokable>> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Call this value, failing if it is not invokable.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, CoreError> {
        match self {
            Value::Function(function) => function.invoke(args),
            other => Err(CoreError::eval(format!(
                "a {} value is not invokable",
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Str(text) => f.write_str(text),
            Value::Function(function) => f.write_str(&function.describe()),
        }
    }
}
