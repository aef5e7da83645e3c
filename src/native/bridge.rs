//! Cross-chain bridge collaborator
//!
//! The VM only hands an opaque payload to a [`CrossChainBridge`] and records
//! the transfer identifier it gets back. Transport and cross-chain consensus
//! live behind the trait.

use crate::contract::value::Value;
use crate::crypto::hash::sha256_parts;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Bridge errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Unsupported target chain: {0}")]
    UnsupportedChain(String),
    #[error("Empty payload")]
    EmptyPayload,
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),
}

/// Relays payloads to other ledgers
pub trait CrossChainBridge: Send {
    /// Submit `payload` for `chain`, returning the bridge transaction id.
    fn relay(&mut self, chain: &str, payload: &[u8]) -> Result<Vec<u8>, BridgeError>;

    /// Called before each execution with the call's seed.
    ///
    /// Ids a bridge derives should depend only on the call and the relays
    /// made within it, so replaying a call yields the same transfers.
    fn begin_call(&mut self, _seed: [u8; 32]) {}
}

/// Bridge handle shared between a runtime and the VMs it creates
pub type SharedBridge = Arc<Mutex<dyn CrossChainBridge>>;

/// In-process bridge that only derives transfer ids.
///
/// Ids are `sha256(seed, chain, payload, nonce)`. The seed identifies the
/// call and the nonce counts relays within it, so two identical payloads in
/// one call get distinct ids while a replayed call gets the same ones.
#[derive(Debug, Clone, Default)]
pub struct LocalBridge {
    seed: [u8; 32],
    nonce: u64,
    /// Accept only these chains; `None` accepts any
    chains: Option<BTreeSet<String>>,
}

impl LocalBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chains<I, S>(chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seed: [0u8; 32],
            nonce: 0,
            chains: Some(chains.into_iter().map(Into::into).collect()),
        }
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn shared(self) -> SharedBridge {
        Arc::new(Mutex::new(self))
    }
}

impl CrossChainBridge for LocalBridge {
    fn begin_call(&mut self, seed: [u8; 32]) {
        self.seed = seed;
        self.nonce = 0;
    }

    fn relay(&mut self, chain: &str, payload: &[u8]) -> Result<Vec<u8>, BridgeError> {
        if let Some(chains) = &self.chains {
            if !chains.contains(chain) {
                return Err(BridgeError::UnsupportedChain(chain.to_string()));
            }
        }
        if payload.is_empty() {
            return Err(BridgeError::EmptyPayload);
        }

        let id = sha256_parts(&[
            &self.seed,
            chain.as_bytes(),
            payload,
            &self.nonce.to_be_bytes(),
        ]);
        self.nonce += 1;
        log::debug!("bridge relay to {}: {}", chain, hex::encode(id));
        Ok(id.to_vec())
    }
}

/// Opaque data recorded with a bridge transfer event
pub fn transfer_payload(chain: &str, tx_id: &[u8], payload: &[u8]) -> Vec<u8> {
    Value::List(vec![
        Value::Bytes(chain.as_bytes().to_vec()),
        Value::Bytes(tx_id.to_vec()),
        Value::Bytes(payload.to_vec()),
    ])
    .to_bytes()
}
