//! Quantum register: the set of qubits visible to one execution

use crate::contract::error::VmError;
use crate::quantum::gates::{self, QuantumGate};
use crate::quantum::qubit::QubitState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default upper bound on qubits allocated by one execution
pub const DEFAULT_MAX_QUBITS: usize = 64;

/// Qubits keyed by identifier. A `BTreeMap` keeps measurement order stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantumState {
    pub qubits: BTreeMap<u32, QubitState>,
}

impl QuantumState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit set of qubits
    pub fn with_qubits(qubits: impl IntoIterator<Item = (u32, QubitState)>) -> Self {
        Self {
            qubits: qubits.into_iter().collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&QubitState> {
        self.qubits.get(&id)
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// Ensure a qubit exists, allocating it in |0⟩.
    fn allocate(&mut self, id: u32, max_qubits: usize) -> Result<(), VmError> {
        if !self.qubits.contains_key(&id) {
            if self.qubits.len() >= max_qubits {
                return Err(VmError::QubitLimitExceeded(self.qubits.len() + 1, max_qubits));
            }
            self.qubits.insert(id, QubitState::ground());
        }
        Ok(())
    }

    /// Apply a gate, allocating any untouched qubit first.
    pub fn apply(&mut self, gate: QuantumGate, max_qubits: usize) -> Result<(), VmError> {
        for id in gate.qubits() {
            self.allocate(id, max_qubits)?;
        }

        match gate {
            QuantumGate::Hadamard(id) => gates::hadamard(self.qubit_mut(id)?, id),
            QuantumGate::PauliX(id) => gates::pauli_x(self.qubit_mut(id)?, id),
            QuantumGate::PauliZ(id) => gates::pauli_z(self.qubit_mut(id)?, id),
            QuantumGate::ControlledNot { control, target } => {
                if control == target {
                    // CNOT on a single qubit degenerates to a conditional X
                    let q = self.qubit_mut(target)?;
                    let mut snapshot = *q;
                    gates::controlled_not(&mut snapshot, q, target)
                } else {
                    let mut control_state = *self.qubit_mut(control)?;
                    let result = gates::controlled_not(
                        &mut control_state,
                        self.qubit_mut(target)?,
                        target,
                    );
                    if result.is_ok() {
                        self.qubits.insert(control, control_state);
                    }
                    result
                }
            }
        }
    }

    /// Measure every qubit in ascending id order.
    ///
    /// Unmeasured qubits draw one outcome weighted by `alpha²` and collapse;
    /// already-measured qubits report their basis without drawing.
    pub fn measure_all(&mut self, rng: &mut MeasurementRng) -> BTreeMap<u32, u8> {
        let mut outcomes = BTreeMap::new();
        for (id, qubit) in self.qubits.iter_mut() {
            let outcome = if qubit.measured {
                qubit.basis()
            } else {
                let outcome = if rng.next_unit() < qubit.probability_zero() {
                    0
                } else {
                    1
                };
                qubit.collapse(outcome);
                outcome
            };
            outcomes.insert(*id, outcome);
        }
        outcomes
    }

    fn qubit_mut(&mut self, id: u32) -> Result<&mut QubitState, VmError> {
        // allocate() has already run for every operand
        self.qubits
            .get_mut(&id)
            .ok_or(VmError::QubitLimitExceeded(0, 0))
    }
}

/// Seeded random source for measurement and the `random` native.
///
/// Re-executing with the same seed replays the same draws.
#[derive(Debug, Clone)]
pub struct MeasurementRng {
    rng: ChaCha20Rng,
}

impl MeasurementRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Uniform draw in `[0, 1)`
    pub fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform draw in `[0, bound)`; full `u64` range when `bound == 0`.
    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            self.rng.gen::<u64>()
        } else {
            self.rng.gen_range(0..bound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_allocates_qubits() {
        let mut state = QuantumState::new();
        state.apply(QuantumGate::PauliX(3), DEFAULT_MAX_QUBITS).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(3).unwrap().beta, 1.0);
    }

    #[test]
    fn test_qubit_limit() {
        let mut state = QuantumState::new();
        state.apply(QuantumGate::Hadamard(0), 1).unwrap();
        let err = state.apply(QuantumGate::Hadamard(1), 1).unwrap_err();
        assert!(matches!(err, VmError::QubitLimitExceeded(2, 1)));
    }

    #[test]
    fn test_measurement_collapses_to_basis() {
        let mut state = QuantumState::new();
        state.apply(QuantumGate::Hadamard(0), 8).unwrap();
        state.apply(QuantumGate::PauliX(1), 8).unwrap();

        let mut rng = MeasurementRng::from_seed([7u8; 32]);
        let outcomes = state.measure_all(&mut rng);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[&1], 1);
        for qubit in state.qubits.values() {
            assert!(qubit.measured);
            assert!(
                (qubit.alpha, qubit.beta) == (1.0, 0.0) || (qubit.alpha, qubit.beta) == (0.0, 1.0)
            );
        }
    }

    #[test]
    fn test_measurement_is_replayable() {
        let run = || {
            let mut state = QuantumState::new();
            for id in 0..16 {
                state.apply(QuantumGate::Hadamard(id), 32).unwrap();
            }
            state.measure_all(&mut MeasurementRng::from_seed([42u8; 32]))
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_bell_pair_outcomes_agree() {
        let mut state = QuantumState::new();
        state.apply(QuantumGate::PauliX(0), 8).unwrap();
        state
            .apply(QuantumGate::ControlledNot { control: 0, target: 1 }, 8)
            .unwrap();
        let outcomes = state.measure_all(&mut MeasurementRng::from_seed([1u8; 32]));
        assert_eq!(outcomes[&0], outcomes[&1]);
        assert!(state.get(1).unwrap().entangled);
    }

    #[test]
    fn test_remeasure_is_stable() {
        let mut state = QuantumState::new();
        state.apply(QuantumGate::Hadamard(0), 8).unwrap();
        let mut rng = MeasurementRng::from_seed([9u8; 32]);
        let first = state.measure_all(&mut rng);
        let second = state.measure_all(&mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bounded_draw() {
        let mut rng = MeasurementRng::from_seed([3u8; 32]);
        for _ in 0..100 {
            assert!(rng.next_bounded(10) < 10);
        }
    }
}
