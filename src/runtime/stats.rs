//! Cumulative runtime statistics
//!
//! Diagnostic totals across calls on one long-lived runtime. Nothing here
//! feeds back into execution.

use crate::contract::context::ExecutionResult;
use crate::contract::vm::VmMetrics;
use crate::memory::GcReport;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStats {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_gas: u64,
    pub peak_heap_bytes: usize,
    pub gc_cycles: u64,
    pub objects_freed: u64,
    pub bytes_freed: u64,
    pub quantum_ops: u64,
    pub bridge_calls: u64,
    pub started_at: DateTime<Utc>,
    pub last_gc_at: Option<DateTime<Utc>>,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            executions: 0,
            successes: 0,
            failures: 0,
            total_gas: 0,
            peak_heap_bytes: 0,
            gc_cycles: 0,
            objects_freed: 0,
            bytes_freed: 0,
            quantum_ops: 0,
            bridge_calls: 0,
            started_at: Utc::now(),
            last_gc_at: None,
        }
    }

    /// Fold one finished execution into the totals
    pub fn record(&mut self, result: &ExecutionResult, metrics: &VmMetrics) {
        self.executions += 1;
        if result.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_gas += result.gas_used;
        self.peak_heap_bytes = self.peak_heap_bytes.max(metrics.peak_heap_bytes);
        self.quantum_ops += metrics.quantum_ops;
        self.bridge_calls += metrics.bridge_calls;

        for report in &result.gc_reports {
            self.record_gc(report);
        }
    }

    /// Fold one collection cycle into the totals
    pub fn record_gc(&mut self, report: &GcReport) {
        self.gc_cycles += 1;
        self.objects_freed += report.objects_freed as u64;
        self.bytes_freed += report.bytes_freed as u64;
        self.last_gc_at = Some(Utc::now());
    }

    /// Average gas per execution
    pub fn average_gas(&self) -> f64 {
        if self.executions == 0 {
            return 0.0;
        }
        self.total_gas as f64 / self.executions as f64
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}
