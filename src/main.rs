//! ccoin-vm CLI Application
//!
//! A command-line interface for assembling and running contracts.

use ccoin_vm::cli::{self, CallOptions};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ccoin-vm")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A deterministic, gas-metered contract VM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program (assembly source or assembled .json)
    Run {
        /// Program file
        file: PathBuf,

        /// Start at this program function instead of offset 0
        #[arg(short, long)]
        entry: Option<String>,

        #[command(flatten)]
        call: CallArgs,
    },

    /// Invoke an ABI function
    Invoke {
        /// Program file
        file: PathBuf,

        /// ABI description (JSON)
        #[arg(long)]
        abi: PathBuf,

        /// Function to invoke
        #[arg(short, long)]
        function: String,

        #[command(flatten)]
        call: CallArgs,
    },

    /// Assemble source into a program file
    Assemble {
        /// Assembly source
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Disassemble a program
    Disasm {
        /// Program file
        file: PathBuf,
    },

    /// Runtime configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Args)]
struct CallArgs {
    /// Runtime configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gas limit
    #[arg(short, long)]
    gas: Option<u64>,

    /// Call data, comma separated literals (e.g. 7,@alice,0xff)
    #[arg(short, long)]
    args: Option<String>,

    /// Caller address
    #[arg(long, default_value = "cli_caller")]
    caller: String,

    /// Contract address
    #[arg(long, default_value = "cli_contract")]
    contract: String,

    /// Block number
    #[arg(long, default_value = "1")]
    block: u64,

    /// Block timestamp
    #[arg(long, default_value = "0")]
    timestamp: u64,

    /// Value transferred with the call
    #[arg(long, default_value = "0")]
    value: u64,

    /// 32-byte hex seed for measurement and `random`
    #[arg(long)]
    entropy: Option<String>,

    /// Enable quantum instructions with an empty register
    #[arg(long)]
    quantum: bool,

    /// Enable the cross-chain bridge
    #[arg(long)]
    cross_chain: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

impl From<CallArgs> for CallOptions {
    fn from(args: CallArgs) -> Self {
        CallOptions {
            config: args.config,
            gas: args.gas,
            args: args
                .args
                .map(|s| s.split(',').map(|a| a.trim().to_string()).collect())
                .unwrap_or_default(),
            caller: args.caller,
            contract: args.contract,
            block_number: args.block,
            timestamp: args.timestamp,
            value: args.value,
            entropy: args.entropy,
            quantum: args.quantum,
            cross_chain: args.cross_chain,
            json: args.json,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "vm_config.json")]
        output: PathBuf,
    },

    /// Validate and print a configuration
    Show {
        /// Configuration file; defaults are shown when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, entry, call } => {
            cli::cmd_run(&file, entry.as_deref(), &call.into())?;
        }

        Commands::Invoke {
            file,
            abi,
            function,
            call,
        } => {
            cli::cmd_invoke(&file, &abi, &function, &call.into())?;
        }

        Commands::Assemble { file, output } => {
            cli::cmd_assemble(&file, &output)?;
        }

        Commands::Disasm { file } => {
            cli::cmd_disasm(&file)?;
        }

        Commands::Config { action } => match action {
            ConfigCommands::Init { output } => {
                cli::cmd_config_init(&output)?;
            }
            ConfigCommands::Show { config } => {
                cli::cmd_config_show(config.as_deref())?;
            }
        },
    }

    Ok(())
}
