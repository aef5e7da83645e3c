//! CLI commands for the VM
//!
//! Implements all command handlers for the CLI interface.

use crate::contract::abi::Abi;
use crate::contract::compiler::{disassemble_program, parse_literal, Compiler};
use crate::contract::context::{ExecutionContext, ExecutionResult};
use crate::contract::program::Program;
use crate::contract::value::Value;
use crate::quantum::QuantumState;
use crate::runtime::{Runtime, RuntimeConfiguration};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Options shared by `run` and `invoke`
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub config: Option<PathBuf>,
    pub gas: Option<u64>,
    pub args: Vec<String>,
    pub caller: String,
    pub contract: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub value: u64,
    /// Hex-encoded 32-byte seed
    pub entropy: Option<String>,
    pub quantum: bool,
    pub cross_chain: bool,
    pub json: bool,
}

impl CallOptions {
    fn configuration(&self) -> CliResult<RuntimeConfiguration> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfiguration::from_file(path)?,
            None => RuntimeConfiguration::default(),
        };
        config.quantum_support |= self.quantum;
        config.cross_chain_enabled |= self.cross_chain;
        Ok(config)
    }

    fn context(&self) -> CliResult<ExecutionContext> {
        let call_data = self
            .args
            .iter()
            .map(|arg| parse_literal(arg))
            .collect::<Result<Vec<Value>, _>>()?;

        let mut context = ExecutionContext::new(&self.contract, &self.caller).with_call_data(call_data);
        context.block_number = self.block_number;
        context.timestamp = self.timestamp;
        context.value = self.value;
        if let Some(gas) = self.gas {
            context = context.with_gas_limit(gas);
        }
        if self.quantum {
            context = context.with_quantum(QuantumState::new());
        }
        if let Some(entropy) = &self.entropy {
            let bytes = hex::decode(entropy)?;
            let seed: [u8; 32] = bytes
                .try_into()
                .map_err(|_| "entropy must be 32 bytes of hex")?;
            context = context.with_entropy(seed);
        }
        Ok(context)
    }
}

/// Load a program from assembly source or, for `.json` files, a saved program
pub fn load_program(path: &Path) -> CliResult<Program> {
    let data = fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        return Ok(serde_json::from_str(&data)?);
    }
    Ok(Compiler::new().assemble(&data)?)
}

/// Run a program from offset 0, or from `entry`
pub fn cmd_run(file: &Path, entry: Option<&str>, options: &CallOptions) -> CliResult<()> {
    let program = load_program(file)?;
    let mut runtime = Runtime::new(options.configuration()?)?;
    let mut context = options.context()?;

    let result = match entry {
        Some(function) => {
            let abi = Abi::for_program(&program);
            runtime.invoke(program, &abi, function, &mut context)?
        }
        None => runtime.execute(program, &mut context),
    };

    print_result(&result, options.json)
}

/// Invoke an ABI function after checking visibility and argument count
pub fn cmd_invoke(file: &Path, abi_file: &Path, function: &str, options: &CallOptions) -> CliResult<()> {
    let program = load_program(file)?;
    let abi: Abi = serde_json::from_str(&fs::read_to_string(abi_file)?)?;
    let mut runtime = Runtime::new(options.configuration()?)?;
    let mut context = options.context()?;

    let result = runtime.invoke(program, &abi, function, &mut context)?;
    print_result(&result, options.json)
}

/// Assemble source into a program file
pub fn cmd_assemble(file: &Path, output: &Path) -> CliResult<()> {
    let source = fs::read_to_string(file)?;
    let program = Compiler::new().assemble(&source)?;
    fs::write(output, serde_json::to_string_pretty(&program)?)?;

    println!("✅ Assembled {} bytes of bytecode", program.len());
    println!("   ├─ Functions: {}", program.functions.len());
    println!("   ├─ Constants: {}", program.constants.len());
    println!("   └─ Code hash: {}", program.code_hash());
    Ok(())
}

/// Print a program's disassembly
pub fn cmd_disasm(file: &Path) -> CliResult<()> {
    let program = load_program(file)?;
    print!("{}", disassemble_program(&program));
    Ok(())
}

/// Write the default configuration to `output`
pub fn cmd_config_init(output: &Path) -> CliResult<()> {
    RuntimeConfiguration::default().to_file(output)?;
    println!("✅ Wrote default configuration to {:?}", output);
    Ok(())
}

/// Validate and print a configuration
pub fn cmd_config_show(path: Option<&Path>) -> CliResult<()> {
    let config = match path {
        Some(path) => RuntimeConfiguration::from_file(path)?,
        None => RuntimeConfiguration::default(),
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_result(result: &ExecutionResult, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.success {
        println!("✅ Execution complete!");
    } else {
        println!("❌ Execution failed ({:?})", result.status);
    }
    if let Some(value) = &result.return_value {
        println!("   ├─ Return value: {}", value);
    }
    if let Some(error) = &result.error {
        println!("   ├─ Error: {}", error.message);
    }
    for line in &result.logs {
        println!("   ├─ Log: {}", line);
    }
    for event in &result.events {
        println!("   ├─ Event: {} 0x{}", event.name, hex::encode(&event.data));
    }
    for (qubit, outcome) in &result.measurements {
        println!("   ├─ Qubit {}: {}", qubit, outcome);
    }
    if !result.gc_reports.is_empty() {
        let freed: usize = result.gc_reports.iter().map(|r| r.objects_freed).sum();
        println!(
            "   ├─ GC: {} cycles, {} objects freed",
            result.gc_reports.len(),
            freed
        );
    }
    println!("   ├─ Call depth: {}", result.max_call_depth);
    println!("   └─ Gas used: {}", result.gas_used);
    Ok(())
}
