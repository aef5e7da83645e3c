//! Contract ABI
//!
//! Describes callable entry points. The VM itself never enforces the ABI;
//! the runtime uses it to validate an invocation before execution starts.

use crate::contract::program::Program;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ABI validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Function not found in ABI: {0}")]
    UnknownFunction(String),
    #[error("Function {0} is not externally callable")]
    NotCallable(String),
    #[error("Function {function} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("Function {0} is declared in the ABI but missing from the program")]
    MissingEntryPoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    External,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Pure,
    View,
    #[default]
    Mutable,
    Payable,
}

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub mutability: Mutability,
}

impl AbiFunction {
    pub fn is_callable(&self) -> bool {
        matches!(self.visibility, Visibility::Public | Visibility::External)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiConstant {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Interface description produced alongside the bytecode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    #[serde(default)]
    pub functions: Vec<AbiFunction>,
    #[serde(default)]
    pub events: Vec<AbiEvent>,
    #[serde(default)]
    pub constants: Vec<AbiConstant>,
}

impl Abi {
    /// Public ABI derived from a program's function table.
    ///
    /// Inputs are untyped and named after their bound locals (`arg0..`).
    pub fn for_program(program: &Program) -> Self {
        let functions = program
            .functions
            .iter()
            .map(|(name, entry)| AbiFunction {
                name: name.clone(),
                inputs: (0..entry.arity)
                    .map(|i| AbiParam {
                        name: format!("arg{}", i),
                        ty: "any".to_string(),
                    })
                    .collect(),
                outputs: Vec::new(),
                visibility: Visibility::Public,
                mutability: Mutability::Mutable,
            })
            .collect();
        let constants = program
            .constants
            .iter()
            .map(|(name, value)| AbiConstant {
                name: name.clone(),
                ty: value.type_name().to_string(),
            })
            .collect();

        Self {
            functions,
            events: Vec::new(),
            constants,
        }
    }

    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Check that `name` may be invoked with `argc` arguments
    pub fn validate_call(&self, name: &str, argc: usize) -> Result<&AbiFunction, AbiError> {
        let function = self
            .function(name)
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))?;

        if !function.is_callable() {
            return Err(AbiError::NotCallable(name.to_string()));
        }

        if function.inputs.len() != argc {
            return Err(AbiError::ArgumentCount {
                function: name.to_string(),
                expected: function.inputs.len(),
                actual: argc,
            });
        }

        Ok(function)
    }

    /// Check that every callable ABI function has an entry in the program
    pub fn check_program(&self, program: &Program) -> Result<(), AbiError> {
        for function in self.functions.iter().filter(|f| f.is_callable()) {
            if program.function(&function.name).is_none() {
                return Err(AbiError::MissingEntryPoint(function.name.clone()));
            }
        }
        Ok(())
    }
}
