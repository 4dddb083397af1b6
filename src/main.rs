//! Multisig CLI Application
//!
//! A command-line interface for driving a threshold-approval wallet.

use clap::{Parser, Subcommand};
use multisig_engine::cli::{self, AppState};
use multisig_engine::multisig::DEFAULT_THRESHOLD;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A multi-party transaction authorization engine", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Init {
        /// Signer identity (repeat for each signer, at least 3)
        #[arg(short, long = "signer", required = true)]
        signers: Vec<String>,

        /// Confirmations required to execute
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Submit a new transaction
    Submit {
        /// Submitting signer
        #[arg(short, long)]
        caller: String,

        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Amount to transfer
        #[arg(short, long)]
        value: u128,

        /// Hex-encoded payload
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Confirm a transaction
    Confirm {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        index: u64,
    },

    /// Revoke a confirmation
    Revoke {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        index: u64,
    },

    /// Execute a confirmed transaction
    Execute {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        index: u64,
    },

    /// Fund the wallet treasury
    Deposit {
        #[arg(short, long)]
        amount: u128,
    },

    /// Signer management
    Signers {
        #[command(subcommand)]
        action: Option<SignerCommands>,
    },

    /// Show wallet info or a single transaction
    Show {
        /// Transaction index
        #[arg(short, long)]
        index: Option<u64>,
    },

    /// List transactions
    List {
        /// Include pending transactions
        #[arg(long)]
        pending: bool,

        /// Include executed transactions
        #[arg(long)]
        executed: bool,
    },

    /// Show the event log
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Export wallet state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum SignerCommands {
    /// Add a signer
    Add {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        signer: String,
    },

    /// Remove a signer
    Remove {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        signer: String,
    },

    /// Replace a signer with a new one
    Replace {
        #[arg(short, long)]
        caller: String,

        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init command separately (doesn't need existing state)
    let command = match cli.command {
        Commands::Init {
            signers,
            threshold,
            label,
        } => return cli::cmd_init(&cli.data_dir, signers, threshold, label),
        command => command,
    };

    let mut state = AppState::load(cli.data_dir.clone())?;

    match command {
        Commands::Init { .. } => unreachable!(),

        Commands::Submit {
            caller,
            to,
            value,
            payload,
        } => cli::cmd_submit(&mut state, &caller, &to, value, payload.as_deref()),

        Commands::Confirm { caller, index } => cli::cmd_confirm(&mut state, &caller, index),

        Commands::Revoke { caller, index } => cli::cmd_revoke(&mut state, &caller, index),

        Commands::Execute { caller, index } => cli::cmd_execute(&mut state, &caller, index),

        Commands::Deposit { amount } => cli::cmd_deposit(&mut state, amount),

        Commands::Signers { action } => match action {
            None => cli::cmd_signers(&state),
            Some(SignerCommands::Add { caller, signer }) => {
                cli::cmd_signer_add(&mut state, &caller, &signer)
            }
            Some(SignerCommands::Remove { caller, signer }) => {
                cli::cmd_signer_remove(&mut state, &caller, &signer)
            }
            Some(SignerCommands::Replace { caller, old, new }) => {
                cli::cmd_signer_replace(&mut state, &caller, &old, &new)
            }
        },

        Commands::Show { index } => cli::cmd_show(&state, index),

        Commands::List { pending, executed } => cli::cmd_list(&state, pending, executed),

        Commands::Events { limit } => cli::cmd_events(&state, limit),

        Commands::Export { output } => cli::cmd_export(&state, &output),
    }
}
