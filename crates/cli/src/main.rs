//! Saltbox CLI - costing scenario replay and reports.
//!
//! # Usage
//!
//! ```bash
//! # Replay a scenario file and print the unit-economics report
//! saltbox costing simulate --input scenario.json
//!
//! # Same, plus an integrity sweep (non-zero exit on drift)
//! saltbox costing simulate --input scenario.json --check
//! ```
//!
//! # Commands
//!
//! - `costing simulate` - Replay receipts/sales/returns through the
//!   costing engine and print the reports as JSON

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "saltbox")]
#[command(author, version, about = "Saltbox back-office CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inventory costing tools
    Costing {
        #[command(subcommand)]
        action: CostingAction,
    },
}

#[derive(Subcommand)]
enum CostingAction {
    /// Replay a scenario file through the costing engine
    Simulate {
        /// Path to the scenario JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Run the integrity sweep after the replay
        #[arg(long)]
        check: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Costing { action } => match action {
            CostingAction::Simulate { input, check } => {
                commands::costing::simulate(&input, check)?;
            }
        },
    }
    Ok(())
}
