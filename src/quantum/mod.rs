//! Quantum register simulation
//!
//! Qubits are simulated with real amplitude pairs. Measurement draws from a
//! ChaCha20 stream seeded by the execution context, so replaying a call with
//! the same seed reproduces its outcomes.

pub mod gates;
pub mod qubit;
pub mod register;

pub use gates::{QuantumGate, CNOT_CONTROL_THRESHOLD};
pub use qubit::QubitState;
pub use register::{MeasurementRng, QuantumState, DEFAULT_MAX_QUBITS};
