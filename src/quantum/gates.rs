//! Quantum gates
//!
//! Gates act on the real amplitude pair of a [`QubitState`]. A gate that
//! would change the basis of an already-measured qubit is rejected.

use crate::contract::error::VmError;
use crate::quantum::qubit::QubitState;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};
use std::fmt;

/// A CNOT control qubit counts as "likely 1" above this `|beta|`
pub const CNOT_CONTROL_THRESHOLD: f64 = 0.5;

/// A gate application with its qubit operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantumGate {
    Hadamard(u32),
    PauliX(u32),
    PauliZ(u32),
    ControlledNot { control: u32, target: u32 },
}

impl QuantumGate {
    /// Gate selector byte used in bytecode
    pub fn code(&self) -> u8 {
        match self {
            QuantumGate::Hadamard(_) => 0x00,
            QuantumGate::PauliX(_) => 0x01,
            QuantumGate::PauliZ(_) => 0x02,
            QuantumGate::ControlledNot { .. } => 0x03,
        }
    }

    /// Number of qubit operands that follow a given selector byte
    pub fn arity(code: u8) -> Option<usize> {
        match code {
            0x00..=0x02 => Some(1),
            0x03 => Some(2),
            _ => None,
        }
    }

    /// Build a gate from its selector and qubit operands
    pub fn from_parts(code: u8, qubits: &[u32]) -> Option<Self> {
        match (code, qubits) {
            (0x00, [q]) => Some(QuantumGate::Hadamard(*q)),
            (0x01, [q]) => Some(QuantumGate::PauliX(*q)),
            (0x02, [q]) => Some(QuantumGate::PauliZ(*q)),
            (0x03, [control, target]) => Some(QuantumGate::ControlledNot {
                control: *control,
                target: *target,
            }),
            _ => None,
        }
    }

    /// Assembly mnemonic
    pub fn name(&self) -> &'static str {
        match self {
            QuantumGate::Hadamard(_) => "H",
            QuantumGate::PauliX(_) => "X",
            QuantumGate::PauliZ(_) => "Z",
            QuantumGate::ControlledNot { .. } => "CNOT",
        }
    }

    /// Qubit operands in encoding order
    pub fn qubits(&self) -> Vec<u32> {
        match self {
            QuantumGate::Hadamard(q) | QuantumGate::PauliX(q) | QuantumGate::PauliZ(q) => {
                vec![*q]
            }
            QuantumGate::ControlledNot { control, target } => vec![*control, *target],
        }
    }
}

impl fmt::Display for QuantumGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for q in self.qubits() {
            write!(f, " {}", q)?;
        }
        Ok(())
    }
}

/// Hadamard: `alpha' = (alpha+beta)/√2`, `beta' = (alpha-beta)/√2`
pub fn hadamard(q: &mut QubitState, id: u32) -> Result<(), VmError> {
    ensure_unmeasured(q, id)?;
    let (a, b) = (q.alpha, q.beta);
    q.alpha = (a + b) * FRAC_1_SQRT_2;
    q.beta = (a - b) * FRAC_1_SQRT_2;
    Ok(())
}

/// Pauli-X: swap amplitudes
pub fn pauli_x(q: &mut QubitState, id: u32) -> Result<(), VmError> {
    ensure_unmeasured(q, id)?;
    std::mem::swap(&mut q.alpha, &mut q.beta);
    Ok(())
}

/// Pauli-Z: negate `beta` and advance the phase by π
pub fn pauli_z(q: &mut QubitState, id: u32) -> Result<(), VmError> {
    ensure_unmeasured(q, id)?;
    q.beta = -q.beta;
    q.phase = (q.phase + PI) % TAU;
    Ok(())
}

/// Controlled-NOT: swap the target's amplitudes when the control is likely 1.
///
/// Both qubits are marked entangled whenever the control is still
/// unmeasured.
pub fn controlled_not(
    control: &mut QubitState,
    target: &mut QubitState,
    target_id: u32,
) -> Result<(), VmError> {
    ensure_unmeasured(target, target_id)?;
    if control.beta.abs() > CNOT_CONTROL_THRESHOLD {
        std::mem::swap(&mut target.alpha, &mut target.beta);
    }
    if !control.measured {
        control.entangled = true;
        target.entangled = true;
    }
    Ok(())
}

fn ensure_unmeasured(q: &QubitState, id: u32) -> Result<(), VmError> {
    if q.measured {
        return Err(VmError::QubitAlreadyMeasured(id));
    }
    Ok(())
}
