//! Split plan CLI commands
//!
//! Execution runs against the simulated transfer gateway and writes
//! notifications to the outbox file.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::plan::{
    format_execution_result, format_plan_details, format_plan_list, format_preview,
};
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::gateway::{OutboxNotifier, SimulatedTransferGateway};
use crate::services::{DepositService, ExecutionEngine, ExecutionResult, SplitPlanService};
use crate::storage::Storage;

/// Split plan subcommands
#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show how a deposit would be split, without saving anything
    Preview {
        /// Deposit ID
        deposit: String,
    },
    /// Create the split plan for a deposit
    Create {
        /// Deposit ID
        deposit: String,
    },
    /// List split plans
    List,
    /// Show a plan and its actions
    Show {
        /// Plan ID, or the ID of its deposit
        plan: String,
    },
    /// Approve a draft plan
    Approve {
        /// Plan ID, or the ID of its deposit
        plan: String,
    },
    /// Execute a plan (approving it first if it is a draft)
    Execute {
        /// Plan ID, or the ID of its deposit
        plan: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry the failed transfers of an executing plan
    Retry {
        /// Plan ID, or the ID of its deposit
        plan: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel a plan that has not finished
    Cancel {
        /// Plan ID, or the ID of its deposit
        plan: String,
    },
    /// Show the audit trail of a plan
    History {
        /// Plan ID, or the ID of its deposit
        plan: String,
    },
}

/// Engine used by the CLI
pub type CliEngine = ExecutionEngine<SimulatedTransferGateway, OutboxNotifier>;

/// Build the execution engine from settings
pub fn build_engine(storage: &Storage, settings: &Settings) -> CliEngine {
    ExecutionEngine::new(
        SimulatedTransferGateway::new(settings.fallback_link_base.clone()),
        OutboxNotifier::new(storage.paths().outbox_file()),
        settings.retry_policy(),
    )
    .with_notifications(settings.notifications_enabled)
}

fn print_result(result: &ExecutionResult, storage: &Storage, json: bool) -> FlowSplitResult<()> {
    if json {
        let rendered = serde_json::to_string_pretty(result)
            .map_err(|e| FlowSplitError::Json(format!("Failed to serialize result: {}", e)))?;
        println!("{}", rendered);
    } else {
        let buckets = storage.buckets.get_all()?;
        print!("{}", format_execution_result(result, &buckets));
    }
    Ok(())
}

/// Handle a plan command
pub async fn handle_plan_command(
    storage: &Storage,
    settings: &Settings,
    cmd: PlanCommands,
) -> FlowSplitResult<()> {
    let service = SplitPlanService::new(storage, settings);
    let deposits = DepositService::new(storage);

    match cmd {
        PlanCommands::Preview { deposit } => {
            let deposit = deposits.resolve(&deposit)?;
            let preview = service.preview(deposit.id)?;
            print!("{}", format_preview(&preview));
        }

        PlanCommands::Create { deposit } => {
            let deposit = deposits.resolve(&deposit)?;
            let plan = service.create(deposit.id)?;
            let buckets = storage.buckets.get_all()?;
            print!("{}", format_plan_details(&plan, &buckets));
        }

        PlanCommands::List => {
            let plans = service.list()?;
            print!("{}", format_plan_list(&plans));
        }

        PlanCommands::Show { plan } => {
            let plan = service.resolve(&plan)?;
            let buckets = storage.buckets.get_all()?;
            print!("{}", format_plan_details(&plan, &buckets));
        }

        PlanCommands::Approve { plan } => {
            let plan = service.resolve(&plan)?;
            let approved = service.approve(plan.id)?;
            println!("Approved split plan {}", approved.id);
        }

        PlanCommands::Execute { plan, json } => {
            let plan = service.resolve(&plan)?;
            let engine = build_engine(storage, settings);
            let result = service.execute(&engine, plan.id).await?;
            print_result(&result, storage, json)?;
        }

        PlanCommands::Retry { plan, json } => {
            let plan = service.resolve(&plan)?;
            let engine = build_engine(storage, settings);
            let result = service.retry(&engine, plan.id).await?;
            print_result(&result, storage, json)?;
        }

        PlanCommands::Cancel { plan } => {
            let plan = service.resolve(&plan)?;
            let cancelled = service.cancel(plan.id)?;
            println!("Cancelled split plan {}", cancelled.id);
            if cancelled.executed_amount().is_positive() {
                println!(
                    "  {} was already transferred and stays in its buckets.",
                    cancelled.executed_amount()
                );
            }
        }

        PlanCommands::History { plan } => {
            let plan = service.resolve(&plan)?;
            let entries = storage.audit().history_for(&plan.id.to_string())?;
            if entries.is_empty() {
                println!("No audit entries for {}", plan.id);
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
    }

    Ok(())
}
