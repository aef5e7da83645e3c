//! Cryptographic helpers used by native functions
//!
//! This module provides:
//! - SHA-256 hashing for the `hash` native and seed derivation
//! - ECDSA signature checks (secp256k1) for the `verify` native

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_hex, sha256_parts};
pub use keys::{public_key_from_bytes, public_key_from_hex, sign_message, verify_signature, KeyError, KeyPair};
