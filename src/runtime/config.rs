//! Runtime configuration
//!
//! Each flag gates the matching VM behaviour: a disabled feature makes its
//! instructions fail deterministically instead of silently doing nothing.

use crate::contract::frame::MAX_CALL_DEPTH;
use crate::memory::{GcPolicy, DEFAULT_GC_THRESHOLD, DEFAULT_HEAP_LIMIT};
use crate::quantum::DEFAULT_MAX_QUBITS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Default operand stack limit
pub const DEFAULT_STACK_LIMIT: usize = 1024;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// VM runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfiguration {
    /// Heap size limit in estimated bytes
    pub heap_size_limit: usize,
    /// Maximum operand stack depth
    pub stack_size_limit: usize,
    /// Maximum call frame depth
    pub max_call_depth: usize,
    pub gc_enabled: bool,
    /// Heap occupancy fraction that starts a collection
    pub gc_threshold: f64,
    pub quantum_support: bool,
    pub cross_chain_enabled: bool,
    /// Qubits one execution may allocate
    pub max_qubits: usize,
}

impl Default for RuntimeConfiguration {
    fn default() -> Self {
        Self {
            heap_size_limit: DEFAULT_HEAP_LIMIT,
            stack_size_limit: DEFAULT_STACK_LIMIT,
            max_call_depth: MAX_CALL_DEPTH,
            gc_enabled: true,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            quantum_support: false,
            cross_chain_enabled: false,
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }
}

impl RuntimeConfiguration {
    /// Check limits and the GC threshold
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heap_size_limit == 0 {
            return Err(ConfigError::Invalid(
                "heap_size_limit must be positive".to_string(),
            ));
        }
        if self.stack_size_limit == 0 {
            return Err(ConfigError::Invalid(
                "stack_size_limit must be positive".to_string(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be positive".to_string(),
            ));
        }
        if !(self.gc_threshold > 0.0 && self.gc_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "gc_threshold must be in (0, 1], got {}",
                self.gc_threshold
            )));
        }
        if self.quantum_support && self.max_qubits == 0 {
            return Err(ConfigError::Invalid(
                "max_qubits must be positive when quantum support is on".to_string(),
            ));
        }
        Ok(())
    }

    pub fn gc_policy(&self) -> GcPolicy {
        GcPolicy {
            enabled: self.gc_enabled,
            threshold: self.gc_threshold,
        }
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
