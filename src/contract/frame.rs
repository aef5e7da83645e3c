//! Call frames
//!
//! Locals belong to exactly one frame and are dropped with it. The
//! outermost frame is never popped by a nested return.

use crate::contract::error::VmError;
use crate::contract::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the frame created for the entry point
pub const ENTRY_FRAME: &str = "main";

/// Maximum call depth
pub const MAX_CALL_DEPTH: usize = 1024;

/// One function invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallFrame {
    /// Function name
    pub function: String,
    /// Local variables owned by this frame
    pub locals: BTreeMap<String, Value>,
    /// Where the caller resumes
    pub return_pc: usize,
    /// Operand stack depth when the frame was entered
    pub stack_base: usize,
    /// Gas charged while this frame was innermost
    pub gas_used: u64,
}

impl CallFrame {
    pub fn new(function: impl Into<String>, return_pc: usize, stack_base: usize) -> Self {
        Self {
            function: function.into(),
            locals: BTreeMap::new(),
            return_pc,
            stack_base,
            gas_used: 0,
        }
    }

    /// Bind positional arguments to `arg0..argN-1`
    pub fn bind_args(&mut self, args: Vec<Value>) {
        for (i, arg) in args.into_iter().enumerate() {
            self.locals.insert(format!("arg{}", i), arg);
        }
    }

    pub fn local(&self, name: &str) -> Result<&Value, VmError> {
        self.locals
            .get(name)
            .ok_or_else(|| VmError::LocalNotFound(name.to_string()))
    }
}

/// Stack of live call frames, innermost last
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
    /// Deepest nesting reached
    peak_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
            peak_depth: 0,
        }
    }

    pub fn push(&mut self, frame: CallFrame) -> Result<(), VmError> {
        if self.frames.len() >= self.max_depth {
            return Err(VmError::CallDepthExceeded(
                self.frames.len() + 1,
                self.max_depth,
            ));
        }
        self.frames.push(frame);
        self.peak_depth = self.peak_depth.max(self.frames.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Result<CallFrame, VmError> {
        self.frames.pop().ok_or(VmError::FrameUnderflow)
    }

    pub fn current(&self) -> Result<&CallFrame, VmError> {
        self.frames.last().ok_or(VmError::FrameUnderflow)
    }

    pub fn current_mut(&mut self) -> Result<&mut CallFrame, VmError> {
        self.frames.last_mut().ok_or(VmError::FrameUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn peak_depth(&self) -> usize {
        self.peak_depth
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate frames from outermost to innermost
    pub fn iter(&self) -> impl Iterator<Item = &CallFrame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.peak_depth = 0;
    }
}
