//! Heap memory and garbage collection
//!
//! This module provides:
//! - A keyed heap with byte-footprint accounting and a size limit
//! - A mark-and-sweep collector that follows nested references
//! - A message-passing trigger for host-requested collections

pub mod gc;
pub mod heap;

pub use gc::{
    collect, trigger_channel, GcPolicy, GcReport, GcRequests, GcTrigger, DEFAULT_GC_THRESHOLD,
};
pub use heap::{entry_size, Heap, DEFAULT_HEAP_LIMIT, ENTRY_OVERHEAD};
