//! Call stack implementation
//!
//! This module provides the observable call stack:
//! - [`CallStack`]: The ordered sequence of frames, top is active
//! - [`Frame`]: One function activation as the visualizer sees it
//!
//! Frames here hold what pause points *publish*, not the executor's live
//! environment. Each pause merges its payload into the active frame, so a
//! frame's mapping only ever grows (create-or-overwrite, never delete).

use super::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Stack frame for a function call
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Frame {
    pub name: String,
    pub variables: IndexMap<String, Value>,
    pub line: Option<usize>,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Frame {
            name: name.into(),
            variables: IndexMap::new(),
            line: None,
        }
    }
}

/// The call stack
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack::default()
    }

    /// Push a new frame and make it current
    pub fn push_frame(&mut self, name: &str) -> &Frame {
        self.frames.push(Frame::new(name));
        &self.frames[self.frames.len() - 1]
    }

    /// Pop the top frame, returning the frame that is now current
    pub fn pop_frame(&mut self) -> Option<&Frame> {
        self.frames.pop();
        self.frames.last()
    }

    /// Get the current (top) frame
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Merge `variables` into the current frame; no-op when the stack is empty
    pub fn update_variables(&mut self, variables: IndexMap<String, Value>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.variables.extend(variables);
        }
    }

    /// Record the last executed line on the current frame
    pub fn set_line(&mut self, line: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = Some(line);
        }
    }

    /// Get all frames, bottom first (for UI display)
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
