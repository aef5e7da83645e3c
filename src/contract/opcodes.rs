//! Contract opcodes
//!
//! Defines the instruction set for the contract virtual machine and the
//! byte layout of each instruction. Every instruction is one opcode byte
//! followed by big-endian operands; strings carry a `u16` length prefix and
//! byte buffers a `u32` length prefix.

use crate::contract::error::VmError;
use crate::quantum::QuantumGate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opcodes for the contract VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    // Stack operations (0x00 - 0x0F)
    /// Push a 64-bit integer
    Push = 0x00,
    /// Pop the top value from the stack
    Pop = 0x01,
    /// Duplicate the top value
    Dup = 0x02,
    /// Swap the top two values
    Swap = 0x03,
    /// Push a byte buffer
    PushBytes = 0x04,
    /// Push an address
    PushAddress = 0x05,
    /// Push a reference to a heap key
    PushRef = 0x06,
    /// Push `true`
    True = 0x07,
    /// Push `false`
    False = 0x08,

    // Arithmetic (0x10 - 0x1F)
    /// Add top two values
    Add = 0x10,
    /// Subtract top from second
    Sub = 0x11,
    /// Multiply top two values
    Mul = 0x12,
    /// Divide second by top
    Div = 0x13,
    /// Modulo second by top
    Mod = 0x14,

    // Comparison (0x20 - 0x2F)
    /// Equal
    Eq = 0x20,
    /// Less than
    Lt = 0x21,
    /// Greater than
    Gt = 0x22,
    /// Less than or equal
    Le = 0x23,
    /// Greater than or equal
    Ge = 0x24,
    /// Not equal
    Neq = 0x25,
    /// Check if zero
    IsZero = 0x26,

    // Logic (0x30 - 0x3F)
    /// Logical (or bitwise for integers) AND
    And = 0x30,
    /// Logical (or bitwise for integers) OR
    Or = 0x31,
    /// Logical (or bitwise for integers) NOT
    Not = 0x32,

    // Control flow (0x40 - 0x4F)
    /// Unconditional jump
    Jump = 0x40,
    /// Conditional jump (if top of stack is truthy)
    JumpIf = 0x41,
    /// Halt execution
    Halt = 0x42,
    /// Return from the current frame
    Return = 0x43,
    /// Revert execution
    Revert = 0x44,
    /// Call a function, native or external contract
    Call = 0x45,

    // Memory (0x50 - 0x5F)
    /// Load heap entry by key
    Load = 0x50,
    /// Store top of stack under a heap key
    Store = 0x51,
    /// Load a frame local
    LoadLocal = 0x52,
    /// Store top of stack into a frame local
    StoreLocal = 0x53,
    /// Replace a reference with the heap value it points at
    Deref = 0x54,
    /// Pack the top `n` values into a list
    Pack = 0x55,

    // Execution context (0x60 - 0x6F)
    /// Push a context register
    Reg = 0x60,

    // Observability (0x70 - 0x7F)
    /// Append top of stack to the log
    Log = 0x70,
    /// Emit a named event carrying the top of stack
    Emit = 0x71,

    // Extended instruction set (0x80 - 0x8F)
    /// Apply a quantum gate
    QuantumGate = 0x80,
    /// Measure every qubit
    QuantumMeasure = 0x81,
    /// Relay a payload to another chain
    Bridge = 0x82,

    // No operation
    Nop = 0xFF,
}

/// Operand kinds, in encoding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    I64,
    U8,
    U32,
    Str,
    Bytes,
    /// Gate selector followed by as many `u32` qubit ids as the gate needs
    Gate,
}

impl OpCode {
    /// Convert byte to opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(OpCode::Push),
            0x01 => Some(OpCode::Pop),
            0x02 => Some(OpCode::Dup),
            0x03 => Some(OpCode::Swap),
            0x04 => Some(OpCode::PushBytes),
            0x05 => Some(OpCode::PushAddress),
            0x06 => Some(OpCode::PushRef),
            0x07 => Some(OpCode::True),
            0x08 => Some(OpCode::False),
            0x10 => Some(OpCode::Add),
            0x11 => Some(OpCode::Sub),
            0x12 => Some(OpCode::Mul),
            0x13 => Some(OpCode::Div),
            0x14 => Some(OpCode::Mod),
            0x20 => Some(OpCode::Eq),
            0x21 => Some(OpCode::Lt),
            0x22 => Some(OpCode::Gt),
            0x23 => Some(OpCode::Le),
            0x24 => Some(OpCode::Ge),
            0x25 => Some(OpCode::Neq),
            0x26 => Some(OpCode::IsZero),
            0x30 => Some(OpCode::And),
            0x31 => Some(OpCode::Or),
            0x32 => Some(OpCode::Not),
            0x40 => Some(OpCode::Jump),
            0x41 => Some(OpCode::JumpIf),
            0x42 => Some(OpCode::Halt),
            0x43 => Some(OpCode::Return),
            0x44 => Some(OpCode::Revert),
            0x45 => Some(OpCode::Call),
            0x50 => Some(OpCode::Load),
            0x51 => Some(OpCode::Store),
            0x52 => Some(OpCode::LoadLocal),
            0x53 => Some(OpCode::StoreLocal),
            0x54 => Some(OpCode::Deref),
            0x55 => Some(OpCode::Pack),
            0x60 => Some(OpCode::Reg),
            0x70 => Some(OpCode::Log),
            0x71 => Some(OpCode::Emit),
            0x80 => Some(OpCode::QuantumGate),
            0x81 => Some(OpCode::QuantumMeasure),
            0x82 => Some(OpCode::Bridge),
            0xFF => Some(OpCode::Nop),
            _ => None,
        }
    }

    /// Look up an opcode by its assembly mnemonic
    pub fn from_name(name: &str) -> Option<Self> {
        OpCode::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// Every opcode, in byte order
    pub const ALL: [OpCode; 43] = [
        OpCode::Push,
        OpCode::Pop,
        OpCode::Dup,
        OpCode::Swap,
        OpCode::PushBytes,
        OpCode::PushAddress,
        OpCode::PushRef,
        OpCode::True,
        OpCode::False,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Mod,
        OpCode::Eq,
        OpCode::Lt,
        OpCode::Gt,
        OpCode::Le,
        OpCode::Ge,
        OpCode::Neq,
        OpCode::IsZero,
        OpCode::And,
        OpCode::Or,
        OpCode::Not,
        OpCode::Jump,
        OpCode::JumpIf,
        OpCode::Halt,
        OpCode::Return,
        OpCode::Revert,
        OpCode::Call,
        OpCode::Load,
        OpCode::Store,
        OpCode::LoadLocal,
        OpCode::StoreLocal,
        OpCode::Deref,
        OpCode::Pack,
        OpCode::Reg,
        OpCode::Log,
        OpCode::Emit,
        OpCode::QuantumGate,
        OpCode::QuantumMeasure,
        OpCode::Bridge,
        OpCode::Nop,
    ];

    /// Operands that follow this opcode in the byte stream
    pub fn operand_layout(&self) -> &'static [OperandKind] {
        match self {
            OpCode::Push => &[OperandKind::I64],
            OpCode::PushBytes => &[OperandKind::Bytes],
            OpCode::PushAddress
            | OpCode::PushRef
            | OpCode::Load
            | OpCode::Store
            | OpCode::LoadLocal
            | OpCode::StoreLocal
            | OpCode::Reg
            | OpCode::Emit
            | OpCode::Bridge => &[OperandKind::Str],
            OpCode::Jump | OpCode::JumpIf => &[OperandKind::U32],
            OpCode::Call => &[OperandKind::Str, OperandKind::U8],
            OpCode::Pack => &[OperandKind::U8],
            OpCode::QuantumGate => &[OperandKind::Gate],
            _ => &[],
        }
    }

    /// Get opcode name for disassembly
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Push => "PUSH",
            OpCode::Pop => "POP",
            OpCode::Dup => "DUP",
            OpCode::Swap => "SWAP",
            OpCode::PushBytes => "PUSHB",
            OpCode::PushAddress => "PUSHA",
            OpCode::PushRef => "PUSHREF",
            OpCode::True => "TRUE",
            OpCode::False => "FALSE",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Eq => "EQ",
            OpCode::Lt => "LT",
            OpCode::Gt => "GT",
            OpCode::Le => "LE",
            OpCode::Ge => "GE",
            OpCode::Neq => "NEQ",
            OpCode::IsZero => "ISZERO",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Not => "NOT",
            OpCode::Jump => "JUMP",
            OpCode::JumpIf => "JUMPI",
            OpCode::Halt => "HALT",
            OpCode::Return => "RETURN",
            OpCode::Revert => "REVERT",
            OpCode::Call => "CALL",
            OpCode::Load => "LOAD",
            OpCode::Store => "STORE",
            OpCode::LoadLocal => "LOADL",
            OpCode::StoreLocal => "STOREL",
            OpCode::Deref => "DEREF",
            OpCode::Pack => "PACK",
            OpCode::Reg => "REG",
            OpCode::Log => "LOG",
            OpCode::Emit => "EMIT",
            OpCode::QuantumGate => "QGATE",
            OpCode::QuantumMeasure => "QMEASURE",
            OpCode::Bridge => "BRIDGE",
            OpCode::Nop => "NOP",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Int(i64),
    U8(u8),
    U32(u32),
    Str(String),
    Bytes(Vec<u8>),
    Gate(QuantumGate),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{}", n),
            Operand::U8(n) => write!(f, "{}", n),
            Operand::U32(n) => write!(f, "0x{:04x}", n),
            Operand::Str(s) => write!(f, "{}", s),
            Operand::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Operand::Gate(g) => write!(f, "{}", g),
        }
    }
}

/// An opcode together with its decoded operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(opcode: OpCode, operands: Vec<Operand>) -> Self {
        Self { opcode, operands }
    }

    /// Instruction without operands
    pub fn bare(opcode: OpCode) -> Self {
        Self::new(opcode, Vec::new())
    }

    /// Decode the operands of `opcode`, starting right after the opcode byte.
    ///
    /// `pc` is the position of the opcode byte itself. Returns the
    /// instruction and the position of the next instruction.
    pub fn decode_operands(
        opcode: OpCode,
        code: &[u8],
        pc: usize,
    ) -> Result<(Self, usize), VmError> {
        let mut reader = OperandReader {
            code,
            pos: pc + 1,
            opcode,
            pc,
        };

        let mut operands = Vec::with_capacity(opcode.operand_layout().len());
        for kind in opcode.operand_layout() {
            let operand = match kind {
                OperandKind::I64 => Operand::Int(i64::from_be_bytes(reader.array::<8>()?)),
                OperandKind::U8 => Operand::U8(reader.array::<1>()?[0]),
                OperandKind::U32 => Operand::U32(reader.u32()?),
                OperandKind::Str => {
                    let len = u16::from_be_bytes(reader.array::<2>()?) as usize;
                    let bytes = reader.slice(len)?;
                    let s = std::str::from_utf8(bytes).map_err(|_| reader.malformed())?;
                    Operand::Str(s.to_string())
                }
                OperandKind::Bytes => {
                    let len = reader.u32()? as usize;
                    Operand::Bytes(reader.slice(len)?.to_vec())
                }
                OperandKind::Gate => {
                    let selector = reader.array::<1>()?[0];
                    let arity = QuantumGate::arity(selector).ok_or_else(|| reader.malformed())?;
                    let mut qubits = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        qubits.push(reader.u32()?);
                    }
                    let gate = QuantumGate::from_parts(selector, &qubits)
                        .ok_or_else(|| reader.malformed())?;
                    Operand::Gate(gate)
                }
            };
            operands.push(operand);
        }

        Ok((Self { opcode, operands }, reader.pos))
    }

    /// Decode the full instruction at `pc`
    pub fn decode(code: &[u8], pc: usize) -> Result<(Self, usize), VmError> {
        let byte = *code.get(pc).ok_or(VmError::InvalidJump(pc as u32))?;
        let opcode =
            OpCode::from_byte(byte).ok_or(VmError::InvalidOpcode { opcode: byte, pc })?;
        Self::decode_operands(opcode, code, pc)
    }

    /// Encode to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.opcode as u8];
        for operand in &self.operands {
            match operand {
                Operand::Int(n) => out.extend_from_slice(&n.to_be_bytes()),
                Operand::U8(n) => out.push(*n),
                Operand::U32(n) => out.extend_from_slice(&n.to_be_bytes()),
                Operand::Str(s) => {
                    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
                    out.extend_from_slice(s.as_bytes());
                }
                Operand::Bytes(b) => {
                    out.extend_from_slice(&(b.len() as u32).to_be_bytes());
                    out.extend_from_slice(b);
                }
                Operand::Gate(gate) => {
                    out.push(gate.code());
                    for q in gate.qubits() {
                        out.extend_from_slice(&q.to_be_bytes());
                    }
                }
            }
        }
        out
    }

    pub fn int(&self, index: usize) -> Result<i64, VmError> {
        match self.operands.get(index) {
            Some(Operand::Int(n)) => Ok(*n),
            _ => Err(self.malformed()),
        }
    }

    pub fn u8(&self, index: usize) -> Result<u8, VmError> {
        match self.operands.get(index) {
            Some(Operand::U8(n)) => Ok(*n),
            _ => Err(self.malformed()),
        }
    }

    pub fn u32(&self, index: usize) -> Result<u32, VmError> {
        match self.operands.get(index) {
            Some(Operand::U32(n)) => Ok(*n),
            _ => Err(self.malformed()),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, VmError> {
        match self.operands.get(index) {
            Some(Operand::Str(s)) => Ok(s),
            _ => Err(self.malformed()),
        }
    }

    pub fn bytes(&self, index: usize) -> Result<&[u8], VmError> {
        match self.operands.get(index) {
            Some(Operand::Bytes(b)) => Ok(b),
            _ => Err(self.malformed()),
        }
    }

    pub fn gate(&self, index: usize) -> Result<QuantumGate, VmError> {
        match self.operands.get(index) {
            Some(Operand::Gate(g)) => Ok(*g),
            _ => Err(self.malformed()),
        }
    }

    fn malformed(&self) -> VmError {
        VmError::MalformedOperand {
            opcode: self.opcode.name(),
            pc: 0,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// Bounds-checked cursor over operand bytes
struct OperandReader<'a> {
    code: &'a [u8],
    pos: usize,
    opcode: OpCode,
    pc: usize,
}

impl<'a> OperandReader<'a> {
    fn slice(&mut self, len: usize) -> Result<&'a [u8], VmError> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.malformed())?;
        let bytes = self.code.get(self.pos..end).ok_or_else(|| self.malformed())?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], VmError> {
        let bytes = self.slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, VmError> {
        Ok(u32::from_be_bytes(self.array::<4>()?))
    }

    fn malformed(&self) -> VmError {
        VmError::MalformedOperand {
            opcode: self.opcode.name(),
            pc: self.pc,
        }
    }
}
