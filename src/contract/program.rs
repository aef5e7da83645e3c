//! Compiled programs
//!
//! A [`Program`] is the unit handed to the VM: bytecode, the table of
//! in-program functions and the named constants loaded into the heap
//! before the first instruction runs.

use crate::contract::value::Value;
use crate::crypto::hash::sha256_hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry point of an in-program function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    /// Byte offset of the first instruction
    pub offset: u32,
    /// Number of positional arguments
    pub arity: u8,
}

/// Bytecode plus its function table and constants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(with = "hex_bytes")]
    pub code: Vec<u8>,
    pub functions: BTreeMap<String, FunctionEntry>,
    pub constants: BTreeMap<String, Value>,
}

impl Program {
    /// Plain bytecode with no functions or constants
    pub fn from_code(code: Vec<u8>) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }

    /// Add a named constant
    pub fn with_constant(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constants.insert(key.into(), value);
        self
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Content hash of the bytecode
    pub fn code_hash(&self) -> String {
        sha256_hex(&self.code)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
