//! Symbol frames
//!
//! A stack of name → value frames, index 0 is global. Rules only ever read
//! and write the active (topmost) frame; nothing looks through to outer
//! frames.

use crate::error::{EngineError, Result};
use crate::value::Value;
use std::collections::BTreeMap;

/// One frame of bindings
pub type Frame = BTreeMap<String, Value>;

/// Stack of symbol frames
#[derive(Debug, Clone)]
pub struct SymbolTable {
    frames: Vec<Frame>,
}

impl SymbolTable {
    /// Create a table with a single global frame
    pub fn new() -> Self {
        SymbolTable {
            frames: vec![Frame::new()],
        }
    }

    /// Push a new frame; returns the new depth
    pub fn push_frame(&mut self) -> usize {
        self.frames.push(Frame::new());
        self.frames.len()
    }

    /// Pop the active frame. The global frame is never popped.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active(&self) -> &Frame {
        // frames is never empty
        &self.frames[self.frames.len() - 1]
    }

    fn active_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Bind `name` in the active frame
    pub fn store(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.active_mut().insert(name.into(), value.into());
    }

    pub fn lookup(&self, name: &str) -> Result<&Value> {
        self.active()
            .get(name)
            .ok_or_else(|| EngineError::undefined_symbol(name))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.active().get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.active().contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.active_mut().remove(name)
    }

    /// Drop every frame but the global one and empty it
    pub fn reset(&mut self) {
        self.frames.truncate(1);
        self.frames[0].clear();
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
