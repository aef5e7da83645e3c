//! ccoin-vm: a deterministic contract virtual machine in Rust
//!
//! This crate provides the execution layer of a contract platform:
//! - Stack-based bytecode VM with static gas metering
//! - Call frames with bounded depth and per-frame locals
//! - Garbage-collected heap with reference tracing
//! - Native functions (hashing, secp256k1 verification, seeded randomness)
//! - Cross-chain bridge dispatch behind a pluggable trait
//! - Quantum register simulation with replayable measurement
//!
//! # Example
//!
//! ```rust
//! use ccoin_vm::contract::{Compiler, ExecutionContext, Value};
//! use ccoin_vm::runtime::{Runtime, RuntimeConfiguration};
//!
//! let mut runtime = Runtime::new(RuntimeConfiguration::default()).unwrap();
//!
//! let program = Compiler::new().assemble("PUSH 20\nPUSH 22\nADD\nRETURN").unwrap();
//! let result = runtime.execute(program, &mut ExecutionContext::default());
//!
//! assert!(result.success);
//! assert_eq!(result.return_value, Some(Value::Int(42)));
//! println!("Gas used: {}", result.gas_used);
//! ```

pub mod cli;
pub mod contract;
pub mod crypto;
pub mod memory;
pub mod native;
pub mod quantum;
pub mod runtime;

// Re-export commonly used types
pub use contract::{
    Compiler, ExecutionContext, ExecutionResult, OpCode, Program, Value, VmError, VM,
};
pub use crypto::KeyPair;
pub use memory::{GcReport, Heap};
pub use quantum::{QuantumGate, QuantumState};
pub use runtime::{Runtime, RuntimeConfiguration};
