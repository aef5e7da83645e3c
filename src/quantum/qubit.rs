//! Single-qubit state

use serde::{Deserialize, Serialize};

/// Tolerance used when checking amplitude normalisation
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// A simulated qubit: two real amplitudes plus a phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QubitState {
    /// Amplitude of |0⟩
    pub alpha: f64,
    /// Amplitude of |1⟩
    pub beta: f64,
    /// Relative phase in radians, kept in `[0, 2π)`
    pub phase: f64,
    /// Set once a controlled gate has coupled this qubit to another
    pub entangled: bool,
    /// Set permanently once the qubit has been measured
    pub measured: bool,
}

impl QubitState {
    /// A fresh qubit in |0⟩
    pub fn ground() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            phase: 0.0,
            entangled: false,
            measured: false,
        }
    }

    /// A fresh qubit in |1⟩
    pub fn excited() -> Self {
        Self {
            alpha: 0.0,
            beta: 1.0,
            ..Self::ground()
        }
    }

    /// `alpha² + beta²`
    pub fn norm_squared(&self) -> f64 {
        self.alpha * self.alpha + self.beta * self.beta
    }

    pub fn is_normalized(&self) -> bool {
        (self.norm_squared() - 1.0).abs() < NORMALIZATION_TOLERANCE
    }

    /// Probability of observing 0, renormalised against drift.
    pub fn probability_zero(&self) -> f64 {
        let norm = self.norm_squared();
        if norm == 0.0 {
            return 1.0;
        }
        (self.alpha * self.alpha) / norm
    }

    /// Collapse to the given basis state and mark as measured.
    pub fn collapse(&mut self, outcome: u8) {
        if outcome == 0 {
            self.alpha = 1.0;
            self.beta = 0.0;
        } else {
            self.alpha = 0.0;
            self.beta = 1.0;
        }
        self.phase = 0.0;
        self.measured = true;
    }

    /// Basis state of a measured qubit
    pub fn basis(&self) -> u8 {
        if self.beta.abs() > self.alpha.abs() {
            1
        } else {
            0
        }
    }
}

impl Default for QubitState {
    fn default() -> Self {
        Self::ground()
    }
}
