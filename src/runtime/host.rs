//! Runtime host
//!
//! Keeps one VM whose state is reset for every call, plus the cumulative
//! statistics and the bridge collaborator shared by those calls.

use crate::contract::abi::{Abi, AbiError};
use crate::contract::context::{ExecutionContext, ExecutionResult};
use crate::contract::error::VmError;
use crate::contract::program::Program;
use crate::contract::vm::VM;
use crate::memory::{GcReport, GcTrigger};
use crate::native::SharedBridge;
use crate::runtime::config::{ConfigError, RuntimeConfiguration};
use crate::runtime::stats::RuntimeStats;
use thiserror::Error;

/// Runtime errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
}

pub struct Runtime {
    vm: VM,
    stats: RuntimeStats,
}

impl Runtime {
    /// Create a runtime after validating `config`
    pub fn new(config: RuntimeConfiguration) -> Result<Self, RuntimeError> {
        config.validate()?;
        log::info!(
            "runtime started (heap {} bytes, gc {}, quantum {}, cross-chain {})",
            config.heap_size_limit,
            config.gc_enabled,
            config.quantum_support,
            config.cross_chain_enabled
        );
        Ok(Self {
            vm: VM::new(config),
            stats: RuntimeStats::new(),
        })
    }

    /// Replace the default local bridge
    pub fn with_bridge(mut self, bridge: SharedBridge) -> Self {
        self.vm = self.vm.with_bridge(bridge);
        self
    }

    pub fn config(&self) -> &RuntimeConfiguration {
        self.vm.config()
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// The VM of the most recent call
    pub fn vm(&self) -> &VM {
        &self.vm
    }

    /// Trigger handle for a host-side collection timer.
    ///
    /// Requests are held while a call runs and honoured once it finishes,
    /// so they never affect a call's gas or outcome.
    pub fn gc_trigger(&self) -> GcTrigger {
        self.vm.gc_trigger()
    }

    /// Run `program` from offset 0
    pub fn execute(&mut self, program: Program, context: &mut ExecutionContext) -> ExecutionResult {
        let result = self.vm.execute(program, context);
        self.finish_call(&result);
        result
    }

    /// Run the ABI function `function`, checking visibility and argument count first
    pub fn invoke(
        &mut self,
        program: Program,
        abi: &Abi,
        function: &str,
        context: &mut ExecutionContext,
    ) -> Result<ExecutionResult, RuntimeError> {
        abi.validate_call(function, context.call_data.len())?;
        abi.check_program(&program)?;

        let result = self.vm.execute_entry(program, context, Some(function));
        self.finish_call(&result);
        Ok(result)
    }

    /// Collect the heap left by the last call
    pub fn collect_garbage(&mut self) -> Result<GcReport, VmError> {
        let report = self.vm.collect_garbage()?;
        self.stats.record_gc(&report);
        Ok(report)
    }

    fn finish_call(&mut self, result: &ExecutionResult) {
        self.stats.record(result, &self.vm.metrics());
        if let Some(report) = self.vm.service_gc_requests() {
            self.stats.record_gc(&report);
        }
    }
}
