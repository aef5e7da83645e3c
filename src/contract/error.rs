//! VM execution errors
//!
//! [`VmError`] is the single fault type of the engine. Each variant maps to
//! an [`ErrorKind`], which is what callers see in
//! [`ExecutionResult::error`](crate::contract::ExecutionResult).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// VM execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error("Out of gas: used {used}, required {required}, limit {limit}")]
    OutOfGas { used: u64, required: u64, limit: u64 },
    #[error("Invalid opcode 0x{opcode:02x} at {pc:#06x}")]
    InvalidOpcode { opcode: u8, pc: usize },
    #[error("Malformed operand for {opcode} at {pc:#06x}")]
    MalformedOperand { opcode: &'static str, pc: usize },
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Stack overflow: limit {0}")]
    StackOverflow(usize),
    #[error("Frame underflow: no caller frame to return to")]
    FrameUnderflow,
    #[error("Call depth exceeded: {0} (max: {1})")]
    CallDepthExceeded(usize, usize),
    #[error("Type mismatch in {instruction}: expected {expected}, got {actual}")]
    TypeMismatch {
        instruction: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid jump destination: {0:#06x}")]
    InvalidJump(u32),
    #[error("Heap key not found: {0}")]
    HeapKeyNotFound(String),
    #[error("Heap limit exceeded: {size} bytes (max: {limit})")]
    HeapLimitExceeded { size: usize, limit: usize },
    #[error("Local variable not found: {0}")]
    LocalNotFound(String),
    #[error("Function {function} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: u8,
        actual: u8,
    },
    #[error("Unknown native function: {0}")]
    UnknownNativeFunction(String),
    #[error("Unknown entry point: {0}")]
    UnknownEntryPoint(String),
    #[error("Native call {function} failed: {reason}")]
    NativeCallFailed { function: String, reason: String },
    #[error("Quantum operations are not supported in this execution")]
    QuantumUnsupported,
    #[error("Qubit {0} has already been measured")]
    QubitAlreadyMeasured(u32),
    #[error("Qubit limit exceeded: {0} (max: {1})")]
    QubitLimitExceeded(usize, usize),
    #[error("Cross-chain calls are disabled")]
    CrossChainDisabled,
    #[error("Bridge call failed: {0}")]
    BridgeFailed(String),
    #[error("Unknown register: {0}")]
    UnknownRegister(String),
    #[error("Execution reverted")]
    Reverted,
    #[error("Garbage collection is disabled")]
    GcDisabled,
    #[error("Execution is no longer running")]
    NotRunning,
}

impl VmError {
    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            VmError::OutOfGas { .. } => ErrorKind::OutOfGas,
            VmError::InvalidOpcode { .. } => ErrorKind::InvalidOpcode,
            VmError::MalformedOperand { .. } => ErrorKind::MalformedOperand,
            VmError::StackUnderflow => ErrorKind::StackUnderflow,
            VmError::StackOverflow(_) => ErrorKind::StackOverflow,
            VmError::FrameUnderflow => ErrorKind::FrameUnderflow,
            VmError::CallDepthExceeded(..) => ErrorKind::CallDepthExceeded,
            VmError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            VmError::DivisionByZero => ErrorKind::DivisionByZero,
            VmError::InvalidJump(_) => ErrorKind::InvalidJump,
            VmError::HeapKeyNotFound(_) | VmError::LocalNotFound(_) => {
                ErrorKind::HeapKeyNotFound
            }
            VmError::HeapLimitExceeded { .. } => ErrorKind::HeapLimitExceeded,
            VmError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            VmError::UnknownNativeFunction(_) => ErrorKind::UnknownNativeFunction,
            VmError::UnknownEntryPoint(_) => ErrorKind::UnknownEntryPoint,
            VmError::NativeCallFailed { .. } => ErrorKind::NativeCallFailed,
            VmError::QuantumUnsupported => ErrorKind::QuantumUnsupported,
            VmError::QubitAlreadyMeasured(_) => ErrorKind::QubitAlreadyMeasured,
            VmError::QubitLimitExceeded(..) => ErrorKind::QubitLimitExceeded,
            VmError::CrossChainDisabled => ErrorKind::CrossChainDisabled,
            VmError::BridgeFailed(_) => ErrorKind::BridgeFailed,
            VmError::UnknownRegister(_) => ErrorKind::UnknownRegister,
            VmError::Reverted => ErrorKind::Reverted,
            VmError::GcDisabled => ErrorKind::GcDisabled,
            VmError::NotRunning => ErrorKind::NotRunning,
        }
    }
}

/// Error taxonomy reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    OutOfGas,
    InvalidOpcode,
    MalformedOperand,
    StackUnderflow,
    StackOverflow,
    FrameUnderflow,
    CallDepthExceeded,
    TypeMismatch,
    DivisionByZero,
    InvalidJump,
    HeapKeyNotFound,
    HeapLimitExceeded,
    ArityMismatch,
    UnknownNativeFunction,
    UnknownEntryPoint,
    NativeCallFailed,
    QuantumUnsupported,
    QubitAlreadyMeasured,
    QubitLimitExceeded,
    CrossChainDisabled,
    BridgeFailed,
    UnknownRegister,
    Reverted,
    GcDisabled,
    NotRunning,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error as carried in an execution result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&VmError> for ExecutionError {
    fn from(err: &VmError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
