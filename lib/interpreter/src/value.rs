use std::fmt::{self, Display, Formatter};

use parser::LiteralValue;

#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    #[from(ignore)]
    Nil,
}

impl Value {
    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Values of different kinds are never equal and nothing gets coerced.
    pub fn equals(&self, other: &Value) -> bool {
        self == other
    }

    pub fn negate(&self) -> Option<Value> {
        match self {
            Value::Number(n) => Some(Value::Number(-n)),
            _ => None,
        }
    }

    pub fn add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Some(Value::String(format!("{a}{b}"))),
            _ => None,
        }
    }

    /// Applies `op` if both operands are numbers.
    pub fn numeric<T: Into<Value>>(
        &self,
        other: &Value,
        op: impl Fn(f64, f64) -> T,
    ) -> Option<Value> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(op(*a, *b).into()),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&LiteralValue<'_>> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => (*s).into(),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Nil => Value::Nil,
        }
    }
}
