//! Execution context and result
//!
//! The context is supplied by the caller and is read-only to the VM apart
//! from `gas_used`. The result is the only observable effect of a call.

use crate::contract::error::{ErrorKind, ExecutionError};
use crate::contract::gas::DEFAULT_GAS_LIMIT;
use crate::contract::value::Value;
use crate::crypto::hash::sha256_parts;
use crate::memory::GcReport;
use crate::quantum::QuantumState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Execution context for the VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Contract address
    pub contract_address: String,
    /// Caller address
    pub caller: String,
    /// Available gas
    pub gas_limit: u64,
    /// Current block number
    pub block_number: u64,
    /// Current block timestamp
    pub timestamp: u64,
    /// Value transferred with the call
    pub value: u64,
    /// Positional call data, bound to `arg0..` in the entry frame
    pub call_data: Vec<Value>,
    /// Qubits visible to this call; `None` disables quantum instructions
    pub quantum: Option<QuantumState>,
    /// Caller-supplied randomness seed, e.g. a transaction hash
    pub entropy: Option<[u8; 32]>,
    /// Gas consumed so far; written by the VM
    pub gas_used: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            caller: String::new(),
            gas_limit: DEFAULT_GAS_LIMIT,
            block_number: 0,
            timestamp: 0,
            value: 0,
            call_data: Vec::new(),
            quantum: None,
            entropy: None,
            gas_used: 0,
        }
    }
}

impl ExecutionContext {
    pub fn new(contract_address: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            caller: caller.into(),
            ..Default::default()
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_call_data(mut self, call_data: Vec<Value>) -> Self {
        self.call_data = call_data;
        self
    }

    pub fn with_quantum(mut self, state: QuantumState) -> Self {
        self.quantum = Some(state);
        self
    }

    pub fn with_entropy(mut self, entropy: [u8; 32]) -> Self {
        self.entropy = Some(entropy);
        self
    }

    /// Seed for the execution's random source.
    ///
    /// Explicit entropy wins; otherwise the seed is a hash of the call's
    /// identifying fields, so a replay of the same call draws the same values.
    pub fn seed(&self) -> [u8; 32] {
        if let Some(entropy) = self.entropy {
            return entropy;
        }
        sha256_parts(&[
            self.contract_address.as_bytes(),
            self.caller.as_bytes(),
            &self.block_number.to_be_bytes(),
            &self.timestamp.to_be_bytes(),
        ])
    }
}

/// Lifecycle of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Returned,
    Faulted,
    OutOfGas,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// An emitted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(with = "hex_data")]
    pub data: Vec<u8>,
}

impl Event {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Event name recorded for calls to other contracts
pub const CONTRACT_CALL_EVENT: &str = "ContractCall";

/// Event name recorded for bridge transfers
pub const BRIDGE_TRANSFER_EVENT: &str = "BridgeTransfer";

/// Result of VM execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Return value (if any)
    pub return_value: Option<Value>,
    /// Gas used
    pub gas_used: u64,
    /// Log lines, in emission order
    pub logs: Vec<String>,
    /// Events, in emission order
    pub events: Vec<Event>,
    /// Qubit id to measured outcome
    pub measurements: BTreeMap<u32, u8>,
    /// Wall time spent executing; diagnostic only
    pub elapsed: Duration,
    /// Error (if failed)
    pub error: Option<ExecutionError>,
    /// Final state
    pub status: ExecutionStatus,
    /// Collections performed during the call
    pub gc_reports: Vec<GcReport>,
    /// Deepest call depth reached
    pub max_call_depth: usize,
}

impl ExecutionResult {
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

mod hex_data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
