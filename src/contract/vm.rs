//! Contract virtual machine
//!
//! A stack-based VM for executing contract bytecode.
//! - Gas is charged before any side effect of an instruction
//! - Operand stack depth and call depth are bounded
//! - The heap is collected only between instructions, never for gas
//! - Randomness comes from a seed carried by the execution context

use crate::contract::context::{
    Event, ExecutionContext, ExecutionResult, ExecutionStatus, BRIDGE_TRANSFER_EVENT,
    CONTRACT_CALL_EVENT,
};
use crate::contract::error::{ExecutionError, VmError};
use crate::contract::frame::{CallFrame, CallStack, ENTRY_FRAME};
use crate::contract::gas::{GasMeter, GasSchedule, UNKNOWN_OPCODE_GAS};
use crate::contract::opcodes::{Instruction, OpCode};
use crate::contract::program::Program;
use crate::contract::value::Value;
use crate::memory::{gc, trigger_channel, GcReport, GcRequests, GcTrigger, Heap};
use crate::native::bridge::transfer_payload;
use crate::native::functions::contract_call_payload;
use crate::native::{parse_external, LocalBridge, NativeEnv, NativeFunction, SharedBridge};
use crate::quantum::{MeasurementRng, QuantumState};
use crate::runtime::RuntimeConfiguration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Registers injected from the execution context
pub const REGISTERS: [&str; 7] = [
    "caller",
    "contract",
    "value",
    "gas_limit",
    "block_number",
    "timestamp",
    "argc",
];

/// Per-call counters reported to the runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VmMetrics {
    pub instructions: u64,
    pub quantum_ops: u64,
    pub bridge_calls: u64,
    pub peak_heap_bytes: usize,
}

/// State owned by one in-flight execution
#[derive(Debug, Clone)]
pub struct VmState {
    /// Offset of the next instruction
    pub pc: usize,
    pub operand_stack: Vec<Value>,
    pub heap: Heap,
    pub registers: BTreeMap<String, Value>,
    pub call_stack: CallStack,
    pub quantum: QuantumState,
    pub status: ExecutionStatus,
}

impl VmState {
    pub fn new(config: &RuntimeConfiguration) -> Self {
        Self {
            pc: 0,
            operand_stack: Vec::with_capacity(256),
            heap: Heap::new(config.heap_size_limit),
            registers: BTreeMap::new(),
            call_stack: CallStack::new(config.max_call_depth),
            quantum: QuantumState::new(),
            status: ExecutionStatus::Running,
        }
    }

    /// Reinitialise every field, keeping the configured limits
    pub fn reset(&mut self) {
        self.pc = 0;
        self.operand_stack.clear();
        self.heap.clear();
        self.registers.clear();
        self.call_stack.clear();
        self.quantum = QuantumState::new();
        self.status = ExecutionStatus::Running;
    }
}

/// The contract virtual machine
pub struct VM {
    config: RuntimeConfiguration,
    state: VmState,
    program: Program,
    gas: GasMeter,
    rng: MeasurementRng,
    /// Whether the context supplied a quantum register
    quantum_enabled: bool,
    bridge: SharedBridge,
    gc_trigger: GcTrigger,
    gc_requests: GcRequests,
    logs: Vec<String>,
    events: Vec<Event>,
    measurements: BTreeMap<u32, u8>,
    gc_reports: Vec<GcReport>,
    return_value: Option<Value>,
    error: Option<VmError>,
    metrics: VmMetrics,
    started: Option<Instant>,
    elapsed: Duration,
}

impl VM {
    /// Create a VM with the given limits and a local bridge
    pub fn new(config: RuntimeConfiguration) -> Self {
        let (gc_trigger, gc_requests) = trigger_channel();
        Self {
            state: VmState::new(&config),
            config,
            program: Program::default(),
            gas: GasMeter::new(0),
            rng: MeasurementRng::from_seed([0u8; 32]),
            quantum_enabled: false,
            bridge: LocalBridge::new().shared(),
            gc_trigger,
            gc_requests,
            logs: Vec::new(),
            events: Vec::new(),
            measurements: BTreeMap::new(),
            gc_reports: Vec::new(),
            return_value: None,
            error: None,
            metrics: VmMetrics::default(),
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Use a specific bridge collaborator
    pub fn with_bridge(mut self, bridge: SharedBridge) -> Self {
        self.bridge = bridge;
        self
    }

    /// Handle for requesting a collection.
    ///
    /// Requests are held until the running call ends and are honoured by
    /// [`VM::service_gc_requests`].
    pub fn gc_trigger(&self) -> GcTrigger {
        self.gc_trigger.clone()
    }

    pub fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.status
    }

    pub fn gas_used(&self) -> u64 {
        self.gas.used()
    }

    pub fn metrics(&self) -> VmMetrics {
        self.metrics
    }

    /// Reset all per-call state
    pub fn reset(&mut self) {
        self.state.reset();
        self.program = Program::default();
        self.gas = GasMeter::new(0);
        self.quantum_enabled = false;
        self.logs.clear();
        self.events.clear();
        self.measurements.clear();
        self.gc_reports.clear();
        self.return_value = None;
        self.error = None;
        self.metrics = VmMetrics::default();
        self.started = None;
        self.elapsed = Duration::ZERO;
    }

    /// Prepare a fresh execution of `program`.
    ///
    /// With `entry = None` execution starts at offset 0 in a frame named
    /// `main`; otherwise at the named program function, whose arity must
    /// match the call data.
    pub fn load(
        &mut self,
        program: Program,
        context: &ExecutionContext,
        entry: Option<&str>,
    ) -> Result<(), VmError> {
        self.reset();
        self.program = program;
        self.gas = GasMeter::new(context.gas_limit);
        self.rng = MeasurementRng::from_seed(context.seed());
        self.quantum_enabled = context.quantum.is_some();
        self.state.quantum = context.quantum.clone().unwrap_or_default();
        self.started = Some(Instant::now());

        if self.config.cross_chain_enabled {
            self.bridge
                .lock()
                .map_err(|_| VmError::BridgeFailed("bridge lock poisoned".to_string()))?
                .begin_call(context.seed());
        }

        self.load_registers(context);

        for (key, value) in &self.program.constants {
            self.state.heap.insert(key.clone(), value.clone())?;
        }
        self.metrics.peak_heap_bytes = self.state.heap.bytes();

        let (function, pc) = match entry {
            None => (ENTRY_FRAME, 0),
            Some(name) => {
                let function = self
                    .program
                    .function(name)
                    .copied()
                    .ok_or_else(|| VmError::UnknownEntryPoint(name.to_string()))?;
                if context.call_data.len() != function.arity as usize {
                    return Err(VmError::ArityMismatch {
                        function: name.to_string(),
                        expected: function.arity,
                        actual: context.call_data.len().min(u8::MAX as usize) as u8,
                    });
                }
                (name, self.jump_target(function.offset)?)
            }
        };

        let mut frame = CallFrame::new(function, self.program.code.len(), 0);
        frame.bind_args(context.call_data.clone());
        self.state.call_stack.push(frame)?;
        self.state.pc = pc;
        Ok(())
    }

    fn load_registers(&mut self, context: &ExecutionContext) {
        let values = [
            Value::Address(context.caller.clone()),
            Value::Address(context.contract_address.clone()),
            saturating_int(context.value),
            saturating_int(context.gas_limit),
            saturating_int(context.block_number),
            saturating_int(context.timestamp),
            saturating_int(context.call_data.len() as u64),
        ];
        for (name, value) in REGISTERS.iter().zip(values) {
            self.state.registers.insert(name.to_string(), value);
        }
    }

    /// Execute `program` from offset 0
    pub fn execute(&mut self, program: Program, context: &mut ExecutionContext) -> ExecutionResult {
        self.execute_entry(program, context, None)
    }

    /// Execute `program`, optionally starting at a named function.
    ///
    /// Writes the final gas total back into `context.gas_used`.
    pub fn execute_entry(
        &mut self,
        program: Program,
        context: &mut ExecutionContext,
        entry: Option<&str>,
    ) -> ExecutionResult {
        log::debug!(
            "executing {} bytes for {} (gas limit {})",
            program.len(),
            context.contract_address,
            context.gas_limit
        );

        match self.load(program, context, entry) {
            Ok(()) => self.run(),
            Err(err) => self.fault(err),
        }

        context.gas_used = self.gas.used();
        self.result()
    }

    /// Step until a terminal state
    pub fn run(&mut self) {
        while self.state.status == ExecutionStatus::Running {
            if self.step().is_err() {
                break;
            }
        }
    }

    /// Execute a single instruction.
    ///
    /// Errors move the machine to a terminal state and are also kept for
    /// the result. Stepping a terminal machine fails with `NotRunning` and
    /// changes nothing.
    pub fn step(&mut self) -> Result<(), VmError> {
        if self.state.status.is_terminal() {
            return Err(VmError::NotRunning);
        }

        if self.state.pc >= self.program.code.len() {
            self.halt();
            return Ok(());
        }

        match self.execute_instruction() {
            Ok(()) => {
                self.after_instruction();
                Ok(())
            }
            Err(err) => {
                self.fault(err.clone());
                Err(err)
            }
        }
    }

    /// Snapshot of the current outcome
    pub fn result(&self) -> ExecutionResult {
        ExecutionResult {
            success: self.state.status == ExecutionStatus::Returned,
            return_value: self.return_value.clone(),
            gas_used: self.gas.used(),
            logs: self.logs.clone(),
            events: self.events.clone(),
            measurements: self.measurements.clone(),
            elapsed: self.elapsed,
            error: self.error.as_ref().map(ExecutionError::from),
            status: self.state.status,
            gc_reports: self.gc_reports.clone(),
            max_call_depth: self.state.call_stack.peak_depth(),
        }
    }

    /// Collect now.
    ///
    /// Host-initiated cycles are returned to the caller and are not part of
    /// the call's `gc_reports`.
    pub fn collect_garbage(&mut self) -> Result<GcReport, VmError> {
        if !self.config.gc_enabled {
            return Err(VmError::GcDisabled);
        }
        Ok(self.collect_heap())
    }

    /// Honour pending trigger requests.
    ///
    /// Returns `None` while a call is in progress (requests stay queued),
    /// when nothing is pending, or when GC is disabled.
    pub fn service_gc_requests(&mut self) -> Option<GcReport> {
        if self.state.status == ExecutionStatus::Running && !self.state.call_stack.is_empty() {
            return None;
        }
        if !self.gc_requests.take_pending() || !self.config.gc_enabled {
            return None;
        }
        let report = self.collect_heap();
        log::debug!("serviced gc request: {} objects freed", report.objects_freed);
        Some(report)
    }

    /// Mark from the operand stack, frame locals and the program's constants
    fn collect_heap(&mut self) -> GcReport {
        let constants: Vec<Value> = self
            .program
            .constants
            .keys()
            .map(|key| Value::Ref(key.clone()))
            .collect();
        let state = &mut self.state;
        let roots = state
            .operand_stack
            .iter()
            .chain(state.call_stack.iter().flat_map(|frame| frame.locals.values()))
            .chain(constants.iter());
        gc::collect(&mut state.heap, roots)
    }

    fn after_instruction(&mut self) {
        self.metrics.instructions += 1;
        self.metrics.peak_heap_bytes = self.metrics.peak_heap_bytes.max(self.state.heap.bytes());

        if self.state.status != ExecutionStatus::Running {
            return;
        }
        if self.config.gc_policy().should_collect(&self.state.heap) {
            let report = self.collect_heap();
            self.gc_reports.push(report);
        }
    }

    fn halt(&mut self) {
        self.return_value = self.state.operand_stack.last().cloned();
        self.state.status = ExecutionStatus::Returned;
        self.finish();
    }

    fn fault(&mut self, err: VmError) {
        self.state.status = match err {
            VmError::OutOfGas { .. } => ExecutionStatus::OutOfGas,
            _ => ExecutionStatus::Faulted,
        };
        log::warn!("execution failed at {:#06x}: {}", self.state.pc, err);
        self.error = Some(err);
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(started) = self.started {
            self.elapsed = started.elapsed();
        }
    }

    fn charge(&mut self, cost: u64) -> Result<(), VmError> {
        self.gas.charge(cost)?;
        if let Ok(frame) = self.state.call_stack.current_mut() {
            frame.gas_used += cost;
        }
        Ok(())
    }

    fn execute_instruction(&mut self) -> Result<(), VmError> {
        let pc = self.state.pc;
        let byte = self.program.code[pc];

        let opcode = match OpCode::from_byte(byte) {
            Some(opcode) => opcode,
            None => {
                self.charge(UNKNOWN_OPCODE_GAS)?;
                return Err(VmError::InvalidOpcode { opcode: byte, pc });
            }
        };

        // Consume gas
        self.charge(GasSchedule::cost(opcode))?;

        let (inst, next_pc) = Instruction::decode_operands(opcode, &self.program.code, pc)?;
        log::trace!("{:04x}: {}", pc, inst);
        self.state.pc = next_pc;

        self.dispatch(&inst)
    }

    fn dispatch(&mut self, inst: &Instruction) -> Result<(), VmError> {
        let name = inst.opcode.name();

        match inst.opcode {
            OpCode::Push => self.push(Value::Int(inst.int(0)?))?,
            OpCode::PushBytes => self.push(Value::Bytes(inst.bytes(0)?.to_vec()))?,
            OpCode::PushAddress => self.push(Value::Address(inst.str(0)?.to_string()))?,
            OpCode::PushRef => self.push(Value::Ref(inst.str(0)?.to_string()))?,
            OpCode::True => self.push(Value::Bool(true))?,
            OpCode::False => self.push(Value::Bool(false))?,
            OpCode::Pop => {
                self.pop()?;
            }
            OpCode::Dup => {
                let value = self.peek()?.clone();
                self.push(value)?;
            }
            OpCode::Swap => {
                let len = self.state.operand_stack.len();
                if len < self.frame_base() + 2 {
                    return Err(VmError::StackUnderflow);
                }
                self.state.operand_stack.swap(len - 1, len - 2);
            }

            OpCode::Add => self.binary_int(name, |a, b| Ok(Value::Int(a.wrapping_add(b))))?,
            OpCode::Sub => self.binary_int(name, |a, b| Ok(Value::Int(a.wrapping_sub(b))))?,
            OpCode::Mul => self.binary_int(name, |a, b| Ok(Value::Int(a.wrapping_mul(b))))?,
            OpCode::Div => self.binary_int(name, |a, b| {
                if b == 0 {
                    return Err(VmError::DivisionByZero);
                }
                Ok(Value::Int(a.wrapping_div(b)))
            })?,
            OpCode::Mod => self.binary_int(name, |a, b| {
                if b == 0 {
                    return Err(VmError::DivisionByZero);
                }
                Ok(Value::Int(a.wrapping_rem(b)))
            })?,

            OpCode::Eq | OpCode::Neq => {
                let b = self.pop()?;
                let a = self.pop()?;
                let equal = a == b;
                self.push(Value::Bool(if inst.opcode == OpCode::Eq {
                    equal
                } else {
                    !equal
                }))?;
            }
            OpCode::Lt => self.binary_int(name, |a, b| Ok(Value::Bool(a < b)))?,
            OpCode::Gt => self.binary_int(name, |a, b| Ok(Value::Bool(a > b)))?,
            OpCode::Le => self.binary_int(name, |a, b| Ok(Value::Bool(a <= b)))?,
            OpCode::Ge => self.binary_int(name, |a, b| Ok(Value::Bool(a >= b)))?,
            OpCode::IsZero => {
                let a = self.pop_int(name)?;
                self.push(Value::Bool(a == 0))?;
            }

            OpCode::And | OpCode::Or => {
                let b = self.pop()?;
                let a = self.pop()?;
                let is_and = inst.opcode == OpCode::And;
                let value = match (a, b) {
                    (Value::Bool(a), Value::Bool(b)) => Value::Bool(if is_and { a && b } else { a || b }),
                    (Value::Int(a), Value::Int(b)) => Value::Int(if is_and { a & b } else { a | b }),
                    (Value::Bool(_), other) | (Value::Int(_), other) | (other, _) => {
                        return Err(type_mismatch(name, "Bool or Int", &other))
                    }
                };
                self.push(value)?;
            }
            OpCode::Not => {
                let value = match self.pop()? {
                    Value::Bool(b) => Value::Bool(!b),
                    Value::Int(n) => Value::Int(!n),
                    other => return Err(type_mismatch(name, "Bool or Int", &other)),
                };
                self.push(value)?;
            }

            OpCode::Jump => {
                self.state.pc = self.jump_target(inst.u32(0)?)?;
            }
            OpCode::JumpIf => {
                let target = inst.u32(0)?;
                let condition = self.pop()?;
                if condition.is_truthy() {
                    self.state.pc = self.jump_target(target)?;
                }
            }
            OpCode::Halt => self.halt(),
            OpCode::Return => self.do_return()?,
            OpCode::Revert => return Err(VmError::Reverted),
            OpCode::Call => self.call(inst.str(0)?, inst.u8(1)?)?,

            OpCode::Load => {
                let value = self.state.heap.get(inst.str(0)?)?.clone();
                self.push(value)?;
            }
            OpCode::Store => {
                let value = self.pop()?;
                self.state.heap.insert(inst.str(0)?, value)?;
            }
            OpCode::LoadLocal => {
                let value = self.state.call_stack.current()?.local(inst.str(0)?)?.clone();
                self.push(value)?;
            }
            OpCode::StoreLocal => {
                let value = self.pop()?;
                self.state
                    .call_stack
                    .current_mut()?
                    .locals
                    .insert(inst.str(0)?.to_string(), value);
            }
            OpCode::Deref => {
                let value = match self.pop()? {
                    Value::Ref(key) => self.state.heap.get(&key)?.clone(),
                    other => return Err(type_mismatch(name, "Ref", &other)),
                };
                self.push(value)?;
            }
            OpCode::Pack => {
                let items = self.pop_n(inst.u8(0)?)?;
                self.push(Value::List(items))?;
            }

            OpCode::Reg => {
                let register = inst.str(0)?;
                let value = self
                    .state
                    .registers
                    .get(register)
                    .cloned()
                    .ok_or_else(|| VmError::UnknownRegister(register.to_string()))?;
                self.push(value)?;
            }

            OpCode::Log => {
                let value = self.pop()?;
                self.logs.push(value.to_string());
            }
            OpCode::Emit => {
                let value = self.pop()?;
                self.events.push(Event::new(inst.str(0)?, value.to_bytes()));
            }

            OpCode::QuantumGate => {
                self.require_quantum()?;
                let gate = inst.gate(0)?;
                self.state.quantum.apply(gate, self.config.max_qubits)?;
                self.metrics.quantum_ops += 1;
            }
            OpCode::QuantumMeasure => {
                self.require_quantum()?;
                let outcomes = self.state.quantum.measure_all(&mut self.rng);
                self.metrics.quantum_ops += 1;
                let values = outcomes.values().map(|o| Value::Int(*o as i64)).collect();
                self.measurements.extend(outcomes);
                self.push(Value::List(values))?;
            }
            OpCode::Bridge => self.bridge(inst.str(0)?)?,

            OpCode::Nop => {}
        }

        Ok(())
    }

    /// `CALL`: program function, then native, then external contract
    fn call(&mut self, name: &str, argc: u8) -> Result<(), VmError> {
        let args = self.pop_n(argc)?;

        if let Some(function) = self.program.function(name).copied() {
            if function.arity != argc {
                return Err(VmError::ArityMismatch {
                    function: name.to_string(),
                    expected: function.arity,
                    actual: argc,
                });
            }
            let target = self.jump_target(function.offset)?;
            let mut frame = CallFrame::new(name, self.state.pc, self.state.operand_stack.len());
            frame.bind_args(args);
            self.state.call_stack.push(frame)?;
            self.state.pc = target;
            log::debug!("call {} (depth {})", name, self.state.call_stack.depth());
            return Ok(());
        }

        if let Some(native) = NativeFunction::from_name(name) {
            let mut env = NativeEnv {
                rng: &mut self.rng,
                logs: &mut self.logs,
            };
            let result = native.call(args, &mut env)?;
            return self.push(result);
        }

        if let Some((address, method)) = parse_external(name) {
            log::debug!("external call to {} recorded", name);
            self.events.push(Event::new(
                CONTRACT_CALL_EVENT,
                contract_call_payload(address, method, args),
            ));
            return self.push(Value::Bool(true));
        }

        Err(VmError::UnknownNativeFunction(name.to_string()))
    }

    /// `RETURN`: leave the current frame, or finish if it is the outermost
    fn do_return(&mut self) -> Result<(), VmError> {
        let base = self.state.call_stack.current()?.stack_base;
        let value = if self.state.operand_stack.len() > base {
            self.state.operand_stack.pop()
        } else {
            None
        };

        if self.state.call_stack.depth() == 1 {
            self.return_value = value;
            self.state.status = ExecutionStatus::Returned;
            self.finish();
            return Ok(());
        }

        let frame = self.state.call_stack.pop()?;
        self.state.operand_stack.truncate(frame.stack_base);
        self.state.pc = frame.return_pc;
        if let Some(value) = value {
            self.push(value)?;
        }
        Ok(())
    }

    /// `BRIDGE`: relay the top of stack and push the transfer id
    fn bridge(&mut self, chain: &str) -> Result<(), VmError> {
        if !self.config.cross_chain_enabled {
            return Err(VmError::CrossChainDisabled);
        }

        let payload = self.pop()?.to_bytes();
        let tx_id = {
            let mut bridge = self
                .bridge
                .lock()
                .map_err(|_| VmError::BridgeFailed("bridge lock poisoned".to_string()))?;
            bridge
                .relay(chain, &payload)
                .map_err(|e| VmError::BridgeFailed(e.to_string()))?
        };

        self.events.push(Event::new(
            BRIDGE_TRANSFER_EVENT,
            transfer_payload(chain, &tx_id, &payload),
        ));
        self.metrics.bridge_calls += 1;
        self.push(Value::Bytes(tx_id))
    }

    fn require_quantum(&self) -> Result<(), VmError> {
        if self.config.quantum_support && self.quantum_enabled {
            Ok(())
        } else {
            Err(VmError::QuantumUnsupported)
        }
    }

    fn jump_target(&self, target: u32) -> Result<usize, VmError> {
        if target as usize >= self.program.code.len() {
            return Err(VmError::InvalidJump(target));
        }
        Ok(target as usize)
    }

    /// Operand stack depth owned by callers of the current frame
    fn frame_base(&self) -> usize {
        self.state
            .call_stack
            .current()
            .map(|frame| frame.stack_base)
            .unwrap_or(0)
    }

    /// Push value onto stack
    fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.state.operand_stack.len() >= self.config.stack_size_limit {
            return Err(VmError::StackOverflow(self.config.stack_size_limit));
        }
        self.state.operand_stack.push(value);
        Ok(())
    }

    /// Pop value from stack; values below the current frame are off limits
    fn pop(&mut self) -> Result<Value, VmError> {
        if self.state.operand_stack.len() <= self.frame_base() {
            return Err(VmError::StackUnderflow);
        }
        self.state.operand_stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value, VmError> {
        if self.state.operand_stack.len() <= self.frame_base() {
            return Err(VmError::StackUnderflow);
        }
        self.state.operand_stack.last().ok_or(VmError::StackUnderflow)
    }

    /// Pop `n` values, returned in push order
    fn pop_n(&mut self, n: u8) -> Result<Vec<Value>, VmError> {
        let n = n as usize;
        let len = self.state.operand_stack.len();
        if len < self.frame_base() + n {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.state.operand_stack.split_off(len - n))
    }

    fn pop_int(&mut self, instruction: &'static str) -> Result<i64, VmError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(type_mismatch(instruction, "Int", &other)),
        }
    }

    fn binary_int(
        &mut self,
        instruction: &'static str,
        op: impl FnOnce(i64, i64) -> Result<Value, VmError>,
    ) -> Result<(), VmError> {
        let b = self.pop_int(instruction)?;
        let a = self.pop_int(instruction)?;
        let value = op(a, b)?;
        self.push(value)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new(RuntimeConfiguration::default())
    }
}

/// Register values above `i64::MAX` read as `i64::MAX`
fn saturating_int(n: u64) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn type_mismatch(instruction: &'static str, expected: &'static str, actual: &Value) -> VmError {
    VmError::TypeMismatch {
        instruction,
        expected,
        actual: actual.type_name(),
    }
}
