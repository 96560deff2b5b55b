//! Deposit CLI commands

use clap::Subcommand;

use crate::display::deposit::{format_deposit_details, format_deposit_list};
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::Money;
use crate::services::{DepositService, RecordDepositInput};
use crate::storage::Storage;

/// Deposit subcommands
#[derive(Subcommand)]
pub enum DepositCommands {
    /// Record an incoming deposit
    Add {
        /// Amount (e.g., "1200.00" or "1200")
        amount: String,
        /// Where the money came from
        #[arg(short, long)]
        source: Option<String>,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Phone or address that receives split notifications
        #[arg(short, long)]
        contact: Option<String>,
    },
    /// List deposits, newest first
    List {
        /// Only deposits without a finished split
        #[arg(short, long)]
        pending: bool,
    },
    /// Show deposit details
    Show {
        /// Deposit ID (full or short)
        deposit: String,
    },
}

/// Handle a deposit command
pub fn handle_deposit_command(storage: &Storage, cmd: DepositCommands) -> FlowSplitResult<()> {
    let service = DepositService::new(storage);

    match cmd {
        DepositCommands::Add {
            amount,
            source,
            description,
            contact,
        } => {
            let amount = Money::parse(&amount).map_err(|e| {
                FlowSplitError::Validation(format!(
                    "Invalid amount: '{}'. Use format like '1200.00' or '1200'. Error: {}",
                    amount, e
                ))
            })?;

            let deposit = service.record(RecordDepositInput {
                amount,
                source,
                description,
                contact,
            })?;

            println!("Recorded deposit: {}", deposit.amount);
            println!("  ID: {}", deposit.id);
            println!();
            println!("Run 'flowsplit plan preview {}' to see the split.", deposit.id);
        }

        DepositCommands::List { pending } => {
            let deposits = service.list(pending)?;
            print!("{}", format_deposit_list(&deposits));
        }

        DepositCommands::Show { deposit } => {
            let found = service.resolve(&deposit)?;
            print!("{}", format_deposit_details(&found));
        }
    }

    Ok(())
}
