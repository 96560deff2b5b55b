use anyhow::Result;
use clap::{Parser, Subcommand};

use flowsplit::cli::{
    handle_bucket_command, handle_deposit_command, handle_plan_command, BucketCommands,
    DepositCommands, PlanCommands,
};
use flowsplit::config::{paths::FlowSplitPaths, settings::Settings};
use flowsplit::logging::setup_logging;
use flowsplit::storage::Storage;

#[derive(Parser)]
#[command(
    name = "flowsplit",
    version,
    about = "Split incoming deposits across buckets",
    long_about = "FlowSplit divides each incoming deposit across your buckets by \
                  fixed amounts and percentages, then drives the transfers: \
                  automatic ones through the transfer gateway, manual ones \
                  through payment links."
)]
struct Cli {
    /// Log filter for this run (e.g. "debug"); overrides the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bucket management commands
    #[command(subcommand)]
    Bucket(BucketCommands),

    /// Deposit commands
    #[command(subcommand)]
    Deposit(DepositCommands),

    /// Split plan commands
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = FlowSplitPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let log_level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    setup_logging(log_level, settings.log_json);

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Bucket(cmd)) => {
            handle_bucket_command(&storage, cmd)?;
        }
        Some(Commands::Deposit(cmd)) => {
            handle_deposit_command(&storage, cmd)?;
        }
        Some(Commands::Plan(cmd)) => {
            handle_plan_command(&storage, &settings, cmd).await?;
        }
        Some(Commands::Init) => {
            println!("Initializing FlowSplit at: {}", paths.base_dir().display());
            flowsplit::storage::init::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next steps:");
            println!("  flowsplit bucket add Savings --percent 15");
            println!("  flowsplit deposit add 1200.00 --source Payroll");
        }
        Some(Commands::Config) => {
            println!("FlowSplit Configuration");
            println!("=======================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Outbox:          {}", paths.outbox_file().display());
            println!();
            println!("Settings:");
            println!("  Remainder policy:   {:?}", settings.remainder_policy);
            println!("  Retry attempts:     {}", settings.retry.max_attempts);
            println!("  Retry base delay:   {}ms", settings.retry.base_delay_ms);
            println!("  Retry backoff:      {:?}", settings.retry.backoff);
            println!(
                "  Notifications:      {}",
                if settings.notifications_enabled { "enabled" } else { "disabled" }
            );
            println!("  Log level:          {}", settings.log_level);
        }
        None => {
            println!("FlowSplit - split incoming deposits across buckets");
            println!();
            if flowsplit::storage::init::needs_initialization(&paths) {
                println!("Run 'flowsplit init' to set up your data directory.");
            }
            println!("Run 'flowsplit --help' for usage information.");
        }
    }

    Ok(())
}
