//! Contract assembler
//!
//! Assembles assembly-like syntax into a [`Program`]. One instruction per
//! line; `;` and `#` start comments.
//!
//! ```text
//! .const limit 10        ; heap constant
//! .func double 1         ; function entry here, one argument
//!     LOADL arg0
//!     PUSH 2
//!     MUL
//!     RETURN
//! :loop                  ; jump label
//!     JUMPI loop
//! ```
//!
//! Constant literals: integers (decimal or `0x` hex are integers only for
//! `PUSH`), `true`/`false`, `0x..` byte strings, `"text"`, `&key` heap
//! references and `@addr` addresses.

use crate::contract::opcodes::{Instruction, OpCode, Operand, OperandKind};
use crate::contract::program::{FunctionEntry, Program};
use crate::contract::value::Value;
use crate::quantum::QuantumGate;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Compiler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),
    #[error("Unknown directive: {0}")]
    UnknownDirective(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Undefined label: {0}")]
    UndefinedLabel(String),
    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),
    #[error("Duplicate function: {0}")]
    DuplicateFunction(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Assembler for contract bytecode
pub struct Compiler {
    /// Output bytecode
    code: Vec<u8>,
    /// Label positions
    labels: HashMap<String, u32>,
    /// Pending label references (position, label_name)
    label_refs: Vec<(usize, String)>,
    functions: BTreeMap<String, FunctionEntry>,
    constants: BTreeMap<String, Value>,
}

impl Compiler {
    /// Create a new compiler
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            labels: HashMap::new(),
            label_refs: Vec::new(),
            functions: BTreeMap::new(),
            constants: BTreeMap::new(),
        }
    }

    /// Assemble source into bytecode only
    pub fn compile(&mut self, source: &str) -> Result<Vec<u8>, CompilerError> {
        Ok(self.assemble(source)?.code)
    }

    /// Assemble source into a program with its function table and constants
    pub fn assemble(&mut self, source: &str) -> Result<Program, CompilerError> {
        self.code.clear();
        self.labels.clear();
        self.label_refs.clear();
        self.functions.clear();
        self.constants.clear();

        for line in source.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(label) = line.strip_prefix(':') {
                let label = label.trim().to_string();
                if self.labels.contains_key(&label) {
                    return Err(CompilerError::DuplicateLabel(label));
                }
                self.labels.insert(label, self.code.len() as u32);
                continue;
            }

            if let Some(directive) = line.strip_prefix('.') {
                self.directive(directive)?;
                continue;
            }

            self.compile_instruction(line)?;
        }

        // Resolve label references
        for (pos, label) in &self.label_refs {
            let addr = self
                .labels
                .get(label)
                .ok_or_else(|| CompilerError::UndefinedLabel(label.clone()))?;
            self.code[*pos..*pos + 4].copy_from_slice(&addr.to_be_bytes());
        }

        Ok(Program {
            code: self.code.clone(),
            functions: self.functions.clone(),
            constants: self.constants.clone(),
        })
    }

    fn directive(&mut self, line: &str) -> Result<(), CompilerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["func", name] | ["func", name, _] => {
                let arity = match parts.get(2) {
                    Some(n) => n
                        .parse::<u8>()
                        .map_err(|_| CompilerError::InvalidNumber(n.to_string()))?,
                    None => 0,
                };
                if self.functions.contains_key(*name) {
                    return Err(CompilerError::DuplicateFunction(name.to_string()));
                }
                self.functions.insert(
                    name.to_string(),
                    FunctionEntry {
                        offset: self.code.len() as u32,
                        arity,
                    },
                );
                Ok(())
            }
            ["const", key, ..] => {
                let literal = line
                    .splitn(3, char::is_whitespace)
                    .nth(2)
                    .map(str::trim)
                    .ok_or_else(|| {
                        CompilerError::InvalidArgument(format!(".const {} requires a value", key))
                    })?;
                let value = parse_literal(literal)?;
                self.constants.insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(CompilerError::UnknownDirective(line.to_string())),
        }
    }

    /// Compile a single instruction
    fn compile_instruction(&mut self, line: &str) -> Result<(), CompilerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = parts[0].to_uppercase();
        let opcode = OpCode::from_name(&mnemonic)
            .ok_or_else(|| CompilerError::UnknownInstruction(mnemonic.clone()))?;

        let arg = |index: usize| -> Result<&str, CompilerError> {
            parts.get(index).copied().ok_or_else(|| {
                CompilerError::InvalidArgument(format!("{} requires an operand", mnemonic))
            })
        };

        let operands = match opcode {
            OpCode::Push => vec![Operand::Int(parse_number(arg(1)?)?)],
            OpCode::PushBytes => vec![Operand::Bytes(parse_bytes(arg(1)?)?)],
            OpCode::Jump | OpCode::JumpIf => {
                // Patched once all labels are known
                self.label_refs.push((self.code.len() + 1, arg(1)?.to_string()));
                vec![Operand::U32(0)]
            }
            OpCode::Call => {
                let argc = match parts.get(2) {
                    Some(n) => n
                        .parse::<u8>()
                        .map_err(|_| CompilerError::InvalidNumber(n.to_string()))?,
                    None => 0,
                };
                vec![Operand::Str(checked_str(arg(1)?)?), Operand::U8(argc)]
            }
            OpCode::Pack => {
                let n = arg(1)?;
                vec![Operand::U8(
                    n.parse::<u8>()
                        .map_err(|_| CompilerError::InvalidNumber(n.to_string()))?,
                )]
            }
            OpCode::QuantumGate => vec![Operand::Gate(parse_gate(&parts[1..])?)],
            _ => match opcode.operand_layout() {
                [] => Vec::new(),
                [OperandKind::Str] => vec![Operand::Str(checked_str(arg(1)?)?)],
                _ => return Err(CompilerError::UnknownInstruction(mnemonic.clone())),
            },
        };

        self.code
            .extend(Instruction::new(opcode, operands).encode());
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(|c| c == ';' || c == '#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse a number (decimal or hex)
fn parse_number(s: &str) -> Result<i64, CompilerError> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        digits.parse::<u64>()
    }
    .map_err(|_| CompilerError::InvalidNumber(s.to_string()))?;

    if negative {
        // Allows i64::MIN
        0i64.checked_sub_unsigned(magnitude)
            .ok_or_else(|| CompilerError::InvalidNumber(s.to_string()))
    } else {
        i64::try_from(magnitude).map_err(|_| CompilerError::InvalidNumber(s.to_string()))
    }
}

fn parse_bytes(s: &str) -> Result<Vec<u8>, CompilerError> {
    let hex = s
        .strip_prefix("0x")
        .ok_or_else(|| CompilerError::InvalidArgument(format!("expected 0x bytes, got {}", s)))?;
    hex::decode(hex).map_err(|_| CompilerError::InvalidArgument(format!("bad hex: {}", s)))
}

fn checked_str(s: &str) -> Result<String, CompilerError> {
    if s.len() > u16::MAX as usize {
        return Err(CompilerError::InvalidArgument(format!(
            "string operand longer than {} bytes",
            u16::MAX
        )));
    }
    Ok(s.to_string())
}

fn parse_qubit(s: &str) -> Result<u32, CompilerError> {
    s.parse::<u32>()
        .map_err(|_| CompilerError::InvalidNumber(s.to_string()))
}

fn parse_gate(args: &[&str]) -> Result<QuantumGate, CompilerError> {
    match args {
        [gate, q] if gate.eq_ignore_ascii_case("H") => Ok(QuantumGate::Hadamard(parse_qubit(q)?)),
        [gate, q] if gate.eq_ignore_ascii_case("X") => Ok(QuantumGate::PauliX(parse_qubit(q)?)),
        [gate, q] if gate.eq_ignore_ascii_case("Z") => Ok(QuantumGate::PauliZ(parse_qubit(q)?)),
        [gate, c, t] if gate.eq_ignore_ascii_case("CNOT") => Ok(QuantumGate::ControlledNot {
            control: parse_qubit(c)?,
            target: parse_qubit(t)?,
        }),
        _ => Err(CompilerError::InvalidArgument(format!(
            "QGATE expects H/X/Z <qubit> or CNOT <control> <target>, got {:?}",
            args
        ))),
    }
}

/// Parse a constant literal
pub fn parse_literal(s: &str) -> Result<Value, CompilerError> {
    let s = s.trim();
    match s {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if let Some(key) = s.strip_prefix('&') {
        return Ok(Value::Ref(key.to_string()));
    }
    if let Some(addr) = s.strip_prefix('@') {
        return Ok(Value::Address(addr.to_string()));
    }
    if let Some(text) = s.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return Ok(Value::Bytes(text.as_bytes().to_vec()));
    }
    if s.starts_with("0x") {
        return parse_bytes(s).map(Value::Bytes);
    }
    parse_number(s).map(Value::Int)
}

/// Disassemble bytecode to readable format
pub fn disassemble(code: &[u8]) -> String {
    disassemble_with(code, &BTreeMap::new())
}

/// Disassemble a program, marking function entry points
pub fn disassemble_program(program: &Program) -> String {
    let mut output = String::new();
    for (key, value) in &program.constants {
        let literal = match value {
            Value::Address(addr) => format!("@{}", addr),
            other => other.to_string(),
        };
        output.push_str(&format!(".const {} {}\n", key, literal));
    }
    output.push_str(&disassemble_with(&program.code, &program.functions));
    output
}

fn disassemble_with(code: &[u8], functions: &BTreeMap<String, FunctionEntry>) -> String {
    let mut output = String::new();
    let mut pc = 0;

    while pc < code.len() {
        for (name, entry) in functions {
            if entry.offset as usize == pc {
                output.push_str(&format!(".func {} {}\n", name, entry.arity));
            }
        }

        let opcode_byte = code[pc];
        match OpCode::from_byte(opcode_byte) {
            Some(opcode) => match Instruction::decode_operands(opcode, code, pc) {
                Ok((inst, next)) => {
                    output.push_str(&format!("{:04x}: {}\n", pc, inst));
                    pc = next;
                }
                Err(_) => {
                    output.push_str(&format!("{:04x}: {} <truncated>\n", pc, opcode.name()));
                    break;
                }
            },
            None => {
                output.push_str(&format!("{:04x}: UNKNOWN 0x{:02x}\n", pc, opcode_byte));
                pc += 1;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        let mut compiler = Compiler::new();
        let code = compiler
            .compile(
                "
            PUSH 42
            RETURN
        ",
            )
            .unwrap();

        assert_eq!(code.len(), 10);
        assert_eq!(code[0], OpCode::Push as u8);
    }

    #[test]
    fn test_compile_with_labels() {
        let mut compiler = Compiler::new();
        let code = compiler
            .compile(
                "
            TRUE
            JUMPI end
            PUSH 999
            :end
            PUSH 42
            RETURN
        ",
            )
            .unwrap();

        // TRUE (1) + JUMPI (5) + PUSH (9) puts `end` at 15
        assert_eq!(&code[2..6], &15u32.to_be_bytes());
    }

    #[test]
    fn test_compile_arithmetic() {
        let mut compiler = Compiler::new();
        let code = compiler
            .compile(
                "
            PUSH 10
            PUSH -20   ; negative literal
            ADD
            RETURN
        ",
            )
            .unwrap();

        assert_eq!(code[0], OpCode::Push as u8);
        assert_eq!(code[9], OpCode::Push as u8);
        assert_eq!(&code[10..18], &(-20i64).to_be_bytes());
        assert_eq!(code[18], OpCode::Add as u8);
        assert_eq!(code[19], OpCode::Return as u8);
    }

    #[test]
    fn test_functions_and_constants() {
        let program = Compiler::new()
            .assemble(
                "
            .const x 3
            .const owner @alice
            .const greeting \"hi there\"
            CALL double 1
            HALT
            .func double 1
            LOADL arg0
            RETURN
        ",
            )
            .unwrap();

        assert_eq!(program.constants["x"], Value::Int(3));
        assert_eq!(
            program.constants["owner"],
            Value::Address("alice".to_string())
        );
        assert_eq!(
            program.constants["greeting"],
            Value::Bytes(b"hi there".to_vec())
        );
        let entry = program.function("double").unwrap();
        assert_eq!(entry.arity, 1);
        // CALL: 1 + 2 + 6 + 1, HALT: 1
        assert_eq!(entry.offset, 11);
    }

    #[test]
    fn test_errors() {
        let mut compiler = Compiler::new();
        assert!(matches!(
            compiler.compile("FROB"),
            Err(CompilerError::UnknownInstruction(_))
        ));
        assert!(matches!(
            compiler.compile("JUMP nowhere"),
            Err(CompilerError::UndefinedLabel(_))
        ));
        assert!(matches!(
            compiler.compile("PUSH abc"),
            Err(CompilerError::InvalidNumber(_))
        ));
        assert!(matches!(
            compiler.compile("LOAD"),
            Err(CompilerError::InvalidArgument(_))
        ));
        assert!(matches!(
            compiler.compile(".func f\n.func f"),
            Err(CompilerError::DuplicateFunction(_))
        ));
        assert!(matches!(
            compiler.compile("QGATE Y 0"),
            Err(CompilerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_number_bounds() {
        assert_eq!(parse_number("0x10").unwrap(), 16);
        assert_eq!(parse_number("-9223372036854775808").unwrap(), i64::MIN);
        assert!(parse_number("9223372036854775808").is_err());
    }

    #[test]
    fn test_disassemble() {
        let program = Compiler::new()
            .assemble(
                "
            .func main 0
            PUSH 42
            QGATE CNOT 0 1
            CALL print 1
            RETURN
        ",
            )
            .unwrap();

        let disasm = disassemble_program(&program);
        assert!(disasm.contains(".func main 0"));
        assert!(disasm.contains("0000: PUSH 42"));
        assert!(disasm.contains("QGATE CNOT 0 1"));
        assert!(disasm.contains("CALL print 1"));
        assert!(disasm.contains("RETURN"));
    }

    #[test]
    fn test_disassemble_unknown_and_truncated() {
        let disasm = disassemble(&[0xEE, OpCode::Push as u8, 0x00]);
        assert!(disasm.contains("0000: UNKNOWN 0xee"));
        assert!(disasm.contains("0001: PUSH <truncated>"));
    }
}
