//! Operand stack
//!
//! LIFO sequence of [`Value`]s. The top of the stack is the most recently
//! pushed value; listings print it first.

use crate::error::{EngineError, Result};
use crate::value::Value;
use ndarray::ArrayD;

/// Operand stack
#[derive(Debug, Default, Clone)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push value onto the top
    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Pop the top value
    pub fn pop(&mut self) -> Result<Value> {
        self.values
            .pop()
            .ok_or_else(|| EngineError::stack_underflow("pop on empty stack"))
    }

    /// Peek at the top value without removing it
    pub fn peek(&self) -> Result<&Value> {
        self.values
            .last()
            .ok_or_else(|| EngineError::stack_underflow("peek on empty stack"))
    }

    pub fn pop_scalar(&mut self) -> Result<f64> {
        match self.pop()? {
            Value::Scalar(x) => Ok(x),
            other => Err(EngineError::type_mismatch("scalar", other.type_name())),
        }
    }

    pub fn pop_array(&mut self) -> Result<ArrayD<f64>> {
        match self.pop()? {
            Value::Array(a) => Ok(a),
            other => Err(EngineError::type_mismatch("array", other.type_name())),
        }
    }

    pub fn pop_label(&mut self) -> Result<String> {
        match self.pop()? {
            Value::Label(s) => Ok(s),
            other => Err(EngineError::type_mismatch("label", other.type_name())),
        }
    }

    /// Discard `n` values, all or nothing
    pub fn drop_n(&mut self, n: usize) -> Result<()> {
        if n > self.values.len() {
            return Err(EngineError::stack_underflow(format!(
                "cannot drop {n} of {} values",
                self.values.len()
            )));
        }
        self.values.truncate(self.values.len() - n);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterate from top to bottom
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().rev()
    }
}
