//! Tagged runtime values
//!
//! Every operand-stack slot, frame local, register and heap entry holds a
//! [`Value`]. The set of variants is closed so that the interpreter's
//! dispatch and the collector's marking are exhaustive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed per-value overhead used by the heap footprint estimate
const VALUE_OVERHEAD: usize = 8;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// 64-bit signed integer (wrapping arithmetic)
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Opaque byte sequence
    Bytes(Vec<u8>),
    /// Account or contract address
    Address(String),
    /// Reference to a heap entry by key
    Ref(String),
    /// Compound value; may embed references
    List(Vec<Value>),
}

impl Value {
    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::Bytes(_) => "Bytes",
            Value::Address(_) => "Address",
            Value::Ref(_) => "Ref",
            Value::List(_) => "List",
        }
    }

    /// Truthiness used by conditional jumps
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::Bytes(b) => !b.is_empty(),
            Value::Address(a) => !a.is_empty(),
            Value::Ref(_) => true,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Approximate number of bytes this value occupies on the heap.
    pub fn estimated_size(&self) -> usize {
        VALUE_OVERHEAD
            + match self {
                Value::Int(_) => 8,
                Value::Bool(_) => 1,
                Value::Bytes(b) => b.len(),
                Value::Address(a) => a.len(),
                Value::Ref(key) => key.len(),
                Value::List(items) => items.iter().map(Value::estimated_size).sum(),
            }
    }

    /// Heap keys referenced directly by this value, including references
    /// nested inside lists.
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        let mut pending = vec![self];
        while let Some(value) = pending.pop() {
            match value {
                Value::Ref(key) => refs.push(key.as_str()),
                Value::List(items) => pending.extend(items.iter()),
                Value::Int(_) | Value::Bool(_) | Value::Bytes(_) | Value::Address(_) => {}
            }
        }
        refs
    }

    /// Canonical byte encoding, used as input to hashing and bridge payloads.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int(n) => n.to_be_bytes().to_vec(),
            Value::Bool(b) => vec![*b as u8],
            Value::Bytes(b) => b.clone(),
            Value::Address(a) => a.as_bytes().to_vec(),
            Value::Ref(key) => key.as_bytes().to_vec(),
            Value::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    let encoded = item.to_bytes();
                    out.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
                    out.extend_from_slice(&encoded);
                }
                out
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Address(a) => write!(f, "{}", a),
            Value::Ref(key) => write!(f, "&{}", key),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_references() {
        let value = Value::List(vec![
            Value::Ref("a".to_string()),
            Value::Int(1),
            Value::List(vec![Value::Ref("b".to_string())]),
        ]);

        let mut refs = value.references();
        refs.sort();
        assert_eq!(refs, vec!["a", "b"]);
        assert!(Value::Int(5).references().is_empty());
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Int(3).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Bytes(vec![]).is_truthy());
    }

    #[test]
    fn test_estimated_size_grows_with_payload() {
        let small = Value::Bytes(vec![0; 4]);
        let large = Value::Bytes(vec![0; 400]);
        assert!(large.estimated_size() > small.estimated_size());
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::Int(7), Value::Bool(true)]);
        assert_eq!(value.to_string(), "[7, true]");
        assert_eq!(Value::Bytes(vec![0xab]).to_string(), "0xab");
    }
}
