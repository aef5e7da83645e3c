//! Allow-listed native functions
//!
//! A `CALL` whose target is not a function of the running program is
//! matched against this list before being treated as an external contract
//! call. Natives run synchronously and push exactly one result.

use crate::contract::error::VmError;
use crate::contract::value::Value;
use crate::crypto::hash::sha256;
use crate::crypto::keys::{public_key_from_bytes, verify_signature};
use crate::quantum::MeasurementRng;

/// Natives callable from contract code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFunction {
    /// Append the argument to the execution log; returns `true`
    Print,
    /// SHA-256 of the argument's canonical bytes
    Hash,
    /// ECDSA check of `(public_key, message, signature)`
    Verify,
    /// Seeded draw, optionally bounded by an integer argument
    Random,
}

/// Mutable execution state a native may touch
pub struct NativeEnv<'a> {
    pub rng: &'a mut MeasurementRng,
    pub logs: &'a mut Vec<String>,
}

impl NativeFunction {
    pub const ALL: [NativeFunction; 4] = [
        NativeFunction::Print,
        NativeFunction::Hash,
        NativeFunction::Verify,
        NativeFunction::Random,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(NativeFunction::Print),
            "hash" => Some(NativeFunction::Hash),
            "verify" => Some(NativeFunction::Verify),
            "random" => Some(NativeFunction::Random),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeFunction::Print => "print",
            NativeFunction::Hash => "hash",
            NativeFunction::Verify => "verify",
            NativeFunction::Random => "random",
        }
    }

    /// Accepted argument counts (inclusive)
    fn arity(&self) -> (u8, u8) {
        match self {
            NativeFunction::Print => (1, 1),
            NativeFunction::Hash => (1, 1),
            NativeFunction::Verify => (3, 3),
            NativeFunction::Random => (0, 1),
        }
    }

    /// Invoke with positional arguments in push order
    pub fn call(&self, args: Vec<Value>, env: &mut NativeEnv<'_>) -> Result<Value, VmError> {
        let (min, max) = self.arity();
        let argc = args.len() as u8;
        if argc < min || argc > max {
            return Err(VmError::ArityMismatch {
                function: self.name().to_string(),
                expected: min,
                actual: argc,
            });
        }

        match self {
            NativeFunction::Print => {
                let line = args[0].to_string();
                log::debug!("print: {}", line);
                env.logs.push(line);
                Ok(Value::Bool(true))
            }
            NativeFunction::Hash => Ok(Value::Bytes(sha256(&args[0].to_bytes()))),
            NativeFunction::Verify => {
                let public_key = self.bytes_arg(&args[0])?;
                let signature = self.bytes_arg(&args[2])?;
                let key = public_key_from_bytes(public_key).map_err(|e| self.failed(e))?;
                let valid = verify_signature(&key, &args[1].to_bytes(), signature)
                    .map_err(|e| self.failed(e))?;
                Ok(Value::Bool(valid))
            }
            NativeFunction::Random => {
                let bound = match args.first() {
                    None => 0,
                    Some(Value::Int(n)) if *n > 0 => *n as u64,
                    Some(other) => {
                        return Err(self.failed(format!(
                            "bound must be a positive Int, got {}",
                            other
                        )))
                    }
                };
                let draw = env.rng.next_bounded(bound);
                // Unbounded draws are folded into the non-negative range
                let n = if bound == 0 { draw >> 1 } else { draw };
                Ok(Value::Int(n as i64))
            }
        }
    }

    fn bytes_arg<'v>(&self, value: &'v Value) -> Result<&'v [u8], VmError> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(VmError::TypeMismatch {
                instruction: self.name(),
                expected: "Bytes",
                actual: other.type_name(),
            }),
        }
    }

    fn failed(&self, reason: impl ToString) -> VmError {
        VmError::NativeCallFailed {
            function: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Split `<address>.<method>` into its parts
pub fn parse_external(name: &str) -> Option<(&str, &str)> {
    let (address, method) = name.split_once('.')?;
    if address.is_empty() || method.is_empty() || method.contains('.') {
        return None;
    }
    Some((address, method))
}

/// Opaque payload recorded for an external contract call
pub fn contract_call_payload(address: &str, method: &str, args: Vec<Value>) -> Vec<u8> {
    Value::List(vec![
        Value::Address(address.to_string()),
        Value::Bytes(method.as_bytes().to_vec()),
        Value::List(args),
    ])
    .to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyPair;

    fn env_parts() -> (MeasurementRng, Vec<String>) {
        (MeasurementRng::from_seed([0u8; 32]), Vec::new())
    }

    #[test]
    fn test_lookup() {
        for native in NativeFunction::ALL {
            assert_eq!(NativeFunction::from_name(native.name()), Some(native));
        }
        assert!(NativeFunction::from_name("teleport").is_none());
    }

    #[test]
    fn test_print_logs() {
        let (mut rng, mut logs) = env_parts();
        let mut env = NativeEnv {
            rng: &mut rng,
            logs: &mut logs,
        };
        let result = NativeFunction::Print
            .call(vec![Value::Int(42)], &mut env)
            .unwrap();
        assert_eq!(result, Value::Bool(true));
        assert_eq!(logs, vec!["42".to_string()]);
    }

    #[test]
    fn test_hash() {
        let (mut rng, mut logs) = env_parts();
        let mut env = NativeEnv {
            rng: &mut rng,
            logs: &mut logs,
        };
        let result = NativeFunction::Hash
            .call(vec![Value::Bytes(b"hello world".to_vec())], &mut env)
            .unwrap();
        assert_eq!(result, Value::Bytes(sha256(b"hello world")));
    }

    #[test]
    fn test_verify() {
        let kp = KeyPair::generate();
        let message = Value::Bytes(b"approve".to_vec());
        let signature = kp.sign(&message.to_bytes()).unwrap();

        let (mut rng, mut logs) = env_parts();
        let mut env = NativeEnv {
            rng: &mut rng,
            logs: &mut logs,
        };
        let args = vec![
            Value::Bytes(kp.public_key_bytes()),
            message,
            Value::Bytes(signature),
        ];
        let result = NativeFunction::Verify.call(args, &mut env).unwrap();
        assert_eq!(result, Value::Bool(true));

        let bad_key = vec![
            Value::Bytes(vec![1, 2, 3]),
            Value::Int(0),
            Value::Bytes(vec![0; 64]),
        ];
        assert!(matches!(
            NativeFunction::Verify.call(bad_key, &mut env),
            Err(VmError::NativeCallFailed { .. })
        ));
    }

    #[test]
    fn test_random_is_seeded() {
        let draw = |seed: u8| {
            let mut rng = MeasurementRng::from_seed([seed; 32]);
            let mut logs = Vec::new();
            let mut env = NativeEnv {
                rng: &mut rng,
                logs: &mut logs,
            };
            NativeFunction::Random
                .call(vec![Value::Int(1000)], &mut env)
                .unwrap()
        };
        assert_eq!(draw(1), draw(1));
        match draw(1) {
            Value::Int(n) => assert!((0..1000).contains(&n)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arity_checked() {
        let (mut rng, mut logs) = env_parts();
        let mut env = NativeEnv {
            rng: &mut rng,
            logs: &mut logs,
        };
        assert!(matches!(
            NativeFunction::Hash.call(vec![], &mut env),
            Err(VmError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_external() {
        assert_eq!(
            parse_external("0xabc.transfer"),
            Some(("0xabc", "transfer"))
        );
        assert_eq!(parse_external("print"), None);
        assert_eq!(parse_external(".transfer"), None);
        assert_eq!(parse_external("a.b.c"), None);
    }
}
