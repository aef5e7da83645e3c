//! Native function and cross-chain dispatch

pub mod bridge;
pub mod functions;

pub use bridge::{BridgeError, CrossChainBridge, LocalBridge, SharedBridge};
pub use functions::{parse_external, NativeEnv, NativeFunction};
