//! Smart contract module
//!
//! Provides the bytecode format and the stack-based virtual machine that
//! executes it.
//!
//! # Overview
//!
//! This module implements:
//! - Opcodes, operand encoding and the static gas table
//! - The VM with call frames, a garbage-collected heap and context registers
//! - A simple assembly-like compiler and a disassembler
//! - ABI descriptions checked before an entry point is invoked
//!
//! # Example
//!
//! ```rust
//! use ccoin_vm::contract::{Compiler, ExecutionContext, Value, VM};
//!
//! let program = Compiler::new()
//!     .assemble(
//!         "
//!     .const x 3
//!     .const y 4
//!     LOAD x
//!     LOAD y
//!     ADD
//!     RETURN
//! ",
//!     )
//!     .unwrap();
//!
//! let mut context = ExecutionContext::new("contract", "caller").with_gas_limit(100);
//! let result = VM::default().execute(program, &mut context);
//! assert_eq!(result.return_value, Some(Value::Int(7)));
//! assert_eq!(result.gas_used, 9);
//! ```

pub mod abi;
pub mod compiler;
pub mod context;
pub mod error;
pub mod frame;
pub mod gas;
pub mod opcodes;
pub mod program;
pub mod value;
pub mod vm;

#[cfg(test)]
mod tests;

pub use abi::{Abi, AbiError, AbiFunction};
pub use compiler::{disassemble, disassemble_program, Compiler, CompilerError};
pub use context::{Event, ExecutionContext, ExecutionResult, ExecutionStatus};
pub use error::{ErrorKind, ExecutionError, VmError};
pub use frame::{CallFrame, CallStack, MAX_CALL_DEPTH};
pub use gas::{GasMeter, GasSchedule, DEFAULT_GAS_LIMIT};
pub use opcodes::{Instruction, OpCode, Operand};
pub use program::{FunctionEntry, Program};
pub use value::Value;
pub use vm::{VmMetrics, VmState, VM};
