//! Gas schedule and metering
//!
//! Costs come only from a static per-opcode table. They never depend on
//! wall-clock time, heap size, operand payload size or randomness, so any
//! re-execution of the same bytecode charges the same gas.

use crate::contract::error::VmError;
use crate::contract::opcodes::OpCode;
use serde::{Deserialize, Serialize};

/// Default gas limit
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;

/// Charged for bytes that do not decode to a known opcode
pub const UNKNOWN_OPCODE_GAS: u64 = 1;

pub const ARITHMETIC_GAS: u64 = 2;
pub const LOAD_GAS: u64 = 3;
pub const STORE_GAS: u64 = 5;
pub const CALL_GAS: u64 = 10;
pub const QUANTUM_GATE_GAS: u64 = 50;
pub const QUANTUM_MEASURE_GAS: u64 = 50;
pub const BRIDGE_GAS: u64 = 100;
pub const RETURN_GAS: u64 = 1;

/// Static opcode cost table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasSchedule;

impl GasSchedule {
    /// Cost of a decoded opcode
    pub fn cost(opcode: OpCode) -> u64 {
        match opcode {
            OpCode::Push
            | OpCode::Pop
            | OpCode::Dup
            | OpCode::Swap
            | OpCode::PushBytes
            | OpCode::PushAddress
            | OpCode::PushRef
            | OpCode::True
            | OpCode::False => 1,
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                ARITHMETIC_GAS
            }
            OpCode::Eq
            | OpCode::Lt
            | OpCode::Gt
            | OpCode::Le
            | OpCode::Ge
            | OpCode::Neq
            | OpCode::IsZero
            | OpCode::And
            | OpCode::Or
            | OpCode::Not => ARITHMETIC_GAS,
            OpCode::Jump | OpCode::JumpIf => 2,
            OpCode::Halt | OpCode::Return | OpCode::Revert => RETURN_GAS,
            OpCode::Call => CALL_GAS,
            OpCode::Load => LOAD_GAS,
            OpCode::Store => STORE_GAS,
            OpCode::LoadLocal | OpCode::StoreLocal => 2,
            OpCode::Deref => LOAD_GAS,
            OpCode::Pack => 3,
            OpCode::Reg => 1,
            OpCode::Log | OpCode::Emit => 3,
            OpCode::QuantumGate => QUANTUM_GATE_GAS,
            OpCode::QuantumMeasure => QUANTUM_MEASURE_GAS,
            OpCode::Bridge => BRIDGE_GAS,
            OpCode::Nop => 1,
        }
    }

    /// Cost of a raw opcode byte, including bytes that do not decode
    pub fn cost_of_byte(byte: u8) -> u64 {
        OpCode::from_byte(byte)
            .map(Self::cost)
            .unwrap_or(UNKNOWN_OPCODE_GAS)
    }
}

/// Running gas total for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Charge `cost`, or fail without charging if it would exceed the limit.
    pub fn charge(&mut self, cost: u64) -> Result<(), VmError> {
        let total = self.used.checked_add(cost).unwrap_or(u64::MAX);
        if total > self.limit {
            return Err(VmError::OutOfGas {
                used: self.used,
                required: cost,
                limit: self.limit,
            });
        }
        self.used = total;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}
