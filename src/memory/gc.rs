//! Mark-and-sweep garbage collector
//!
//! Marking is a worklist traversal: it starts from the heap keys referenced
//! by the roots (operand stack and frame locals) and follows references
//! held by heap values until no unvisited key remains. Sweeping deletes
//! every unmarked entry. Roots themselves are never modified.
//!
//! Collection never happens inside an instruction. The VM checks
//! [`GcPolicy::should_collect`] and drains its [`GcTrigger`] requests only
//! between instructions, and gas is never charged for a cycle.

use crate::contract::error::VmError;
use crate::contract::value::Value;
use crate::memory::heap::Heap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

/// Default occupancy at which a collection starts
pub const DEFAULT_GC_THRESHOLD: f64 = 0.75;

/// Outcome of one collection cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GcReport {
    pub objects_freed: usize,
    pub bytes_freed: usize,
    pub live_objects: usize,
    /// Footprint after the sweep
    pub heap_bytes: usize,
    pub occupancy: f64,
    pub fragmentation: f64,
    /// Wall time; diagnostic only
    pub duration: Duration,
}

/// When the VM should collect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcPolicy {
    pub enabled: bool,
    /// Occupancy fraction in `(0, 1]`
    pub threshold: f64,
}

impl GcPolicy {
    pub fn should_collect(&self, heap: &Heap) -> bool {
        self.enabled && heap.occupancy() >= self.threshold
    }
}

impl Default for GcPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_GC_THRESHOLD,
        }
    }
}

/// Heap keys reachable from `roots`
pub fn mark<'a>(heap: &Heap, roots: impl IntoIterator<Item = &'a Value>) -> BTreeSet<String> {
    let mut marked = BTreeSet::new();
    let mut worklist: Vec<&str> = roots.into_iter().flat_map(Value::references).collect();

    while let Some(key) = worklist.pop() {
        if marked.contains(key) {
            continue;
        }
        // References to missing keys are dangling; nothing to keep
        if let Ok(value) = heap.get(key) {
            marked.insert(key.to_string());
            worklist.extend(value.references());
        }
    }

    marked
}

/// Delete every entry not in `marked`. Returns `(objects, bytes)` freed.
pub fn sweep(heap: &mut Heap, marked: &BTreeSet<String>) -> (usize, usize) {
    let garbage: Vec<String> = heap
        .keys()
        .filter(|key| !marked.contains(*key))
        .cloned()
        .collect();

    let mut bytes_freed = 0;
    for key in &garbage {
        bytes_freed += heap.remove(key).unwrap_or(0);
    }
    (garbage.len(), bytes_freed)
}

/// Run one full cycle
pub fn collect<'a>(heap: &mut Heap, roots: impl IntoIterator<Item = &'a Value>) -> GcReport {
    let started = Instant::now();

    let marked = mark(heap, roots);
    let (objects_freed, bytes_freed) = sweep(heap, &marked);

    let report = GcReport {
        objects_freed,
        bytes_freed,
        live_objects: heap.len(),
        heap_bytes: heap.bytes(),
        occupancy: heap.occupancy(),
        fragmentation: heap.fragmentation(),
        duration: started.elapsed(),
    };

    log::debug!(
        "GC freed {} objects ({} bytes), {} live, occupancy {:.2}",
        report.objects_freed,
        report.bytes_freed,
        report.live_objects,
        report.occupancy
    );

    report
}

/// Handle a host uses to request a collection between calls.
///
/// Cloneable and `Send`, so a timer thread owned by the host can hold one.
#[derive(Debug, Clone)]
pub struct GcTrigger {
    tx: Sender<()>,
}

impl GcTrigger {
    /// Request a collection; fails once the receiving VM has been dropped.
    pub fn request(&self) -> Result<(), VmError> {
        self.tx.send(()).map_err(|_| VmError::NotRunning)
    }
}

/// Receiving side, owned by the VM
#[derive(Debug)]
pub struct GcRequests {
    rx: Receiver<()>,
}

impl GcRequests {
    /// Drain every pending request. True if at least one was queued.
    pub fn take_pending(&self) -> bool {
        let mut pending = false;
        loop {
            match self.rx.try_recv() {
                Ok(()) => pending = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        pending
    }
}

/// Create a connected trigger pair
pub fn trigger_channel() -> (GcTrigger, GcRequests) {
    let (tx, rx) = mpsc::channel();
    (GcTrigger { tx }, GcRequests { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(key: &str) -> Value {
        Value::Ref(key.to_string())
    }

    #[test]
    fn test_unreferenced_entries_swept() {
        let mut heap = Heap::default();
        heap.insert("kept", Value::Int(1)).unwrap();
        heap.insert("dropped", Value::Int(2)).unwrap();

        let roots = vec![r("kept")];
        let report = collect(&mut heap, &roots);

        assert_eq!(report.objects_freed, 1);
        assert_eq!(report.live_objects, 1);
        assert!(heap.contains("kept"));
        assert!(!heap.contains("dropped"));
        assert_eq!(roots, vec![r("kept")]);
    }

    #[test]
    fn test_transitive_references_survive() {
        let mut heap = Heap::default();
        heap.insert("root", Value::List(vec![r("mid"), Value::Int(0)]))
            .unwrap();
        heap.insert("mid", Value::List(vec![Value::List(vec![r("leaf")])]))
            .unwrap();
        heap.insert("leaf", Value::Bytes(vec![1, 2, 3])).unwrap();
        heap.insert("orphan", r("leaf")).unwrap();

        let report = collect(&mut heap, &[r("root")]);

        assert!(heap.contains("root"));
        assert!(heap.contains("mid"));
        assert!(heap.contains("leaf"));
        assert!(!heap.contains("orphan"));
        assert_eq!(report.objects_freed, 1);
    }

    #[test]
    fn test_cycles_terminate() {
        let mut heap = Heap::default();
        heap.insert("a", r("b")).unwrap();
        heap.insert("b", r("a")).unwrap();
        heap.insert("c", r("c")).unwrap();

        let marked = mark(&heap, &[r("a")]);
        assert_eq!(marked.len(), 2);

        let (objects, _) = sweep(&mut heap, &marked);
        assert_eq!(objects, 1);
        assert!(!heap.contains("c"));
    }

    #[test]
    fn test_empty_roots_clear_heap() {
        let mut heap = Heap::default();
        heap.insert("x", Value::Int(3)).unwrap();
        let before = heap.bytes();
        let report = collect(&mut heap, std::iter::empty());
        assert_eq!(report.bytes_freed, before);
        assert_eq!(report.heap_bytes, 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_policy_threshold() {
        let mut heap = Heap::new(100);
        let policy = GcPolicy {
            enabled: true,
            threshold: 0.5,
        };
        assert!(!policy.should_collect(&heap));
        heap.insert("k", Value::Bytes(vec![0; 40])).unwrap();
        assert!(policy.should_collect(&heap));

        let disabled = GcPolicy {
            enabled: false,
            ..policy
        };
        assert!(!disabled.should_collect(&heap));
    }

    #[test]
    fn test_trigger_channel() {
        let (trigger, requests) = trigger_channel();
        assert!(!requests.take_pending());

        trigger.request().unwrap();
        trigger.clone().request().unwrap();
        assert!(requests.take_pending());
        assert!(!requests.take_pending());

        drop(requests);
        assert_eq!(trigger.request().unwrap_err(), VmError::NotRunning);
    }

    #[test]
    fn test_trigger_from_other_thread() {
        let (trigger, requests) = trigger_channel();
        std::thread::spawn(move || trigger.request().unwrap())
            .join()
            .unwrap();
        assert!(requests.take_pending());
    }
}
