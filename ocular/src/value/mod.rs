//! Runtime values held on the operand stack and in symbol frames

use ndarray::{ArrayD, ArrayViewD, Axis};
use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit floating point
    Scalar(f64),
    /// N-dimensional numeric grid
    Array(ArrayD<f64>),
    /// Bare text, pushed by `'name`
    Label(String),
    /// Stored instruction sequence, defined by `:name|tok|...`
    CodeBlock(Vec<String>),
}

impl Value {
    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(_) => "array",
            Value::Label(_) => "label",
            Value::CodeBlock(_) => "code block",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Scalar(_) | Value::Array(_))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Array(a)
    }
}

fn write_grid(f: &mut fmt::Formatter<'_>, view: ArrayViewD<'_, f64>) -> fmt::Result {
    if view.ndim() == 0 {
        return match view.iter().next() {
            Some(x) => write!(f, "{x:?}"),
            None => Ok(()),
        };
    }
    write!(f, "[")?;
    for (i, sub) in view.axis_iter(Axis(0)).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_grid(f, sub)?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "{x:?}"),
            Value::Array(a) => write_grid(f, a.view()),
            Value::Label(s) => write!(f, "{s}"),
            Value::CodeBlock(tokens) => write!(f, "{{{}}}", tokens.join("|")),
        }
    }
}
