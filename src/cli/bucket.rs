//! Bucket CLI commands
//!
//! Implements CLI commands for managing split destinations.

use clap::Subcommand;

use crate::display::bucket::{format_bucket_details, format_bucket_list};
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::{AllocationRule, Money, Percentage};
use crate::services::{BucketService, CreateBucketInput};
use crate::storage::Storage;

/// Bucket subcommands
#[derive(Subcommand)]
pub enum BucketCommands {
    /// Add a bucket
    Add {
        /// Bucket name
        name: String,
        /// Percentage of what fixed buckets leave (e.g., "10" or "12.5")
        #[arg(short, long, conflicts_with = "fixed", required_unless_present = "fixed")]
        percent: Option<String>,
        /// Fixed amount taken first (e.g., "900.00")
        #[arg(short, long)]
        fixed: Option<String>,
        /// Payment link template; makes transfers to this bucket manual.
        /// Supports {amount}, {deposit} and {bucket} placeholders
        #[arg(short, long)]
        link: Option<String>,
        /// Name of the account or organisation behind the link
        #[arg(long)]
        external_name: Option<String>,
        /// Position in allocation order (defaults to last)
        #[arg(short, long, allow_negative_numbers = true)]
        order: Option<i32>,
    },
    /// List buckets in allocation order
    List {
        /// Include inactive buckets
        #[arg(short, long)]
        all: bool,
    },
    /// Show bucket details
    Show {
        /// Bucket name or ID
        bucket: String,
    },
    /// Stop allocating to a bucket
    Deactivate {
        /// Bucket name or ID
        bucket: String,
    },
    /// Move a bucket in allocation order
    Reorder {
        /// Bucket name or ID
        bucket: String,
        /// New position
        #[arg(allow_negative_numbers = true)]
        order: i32,
    },
}

fn parse_rule(percent: Option<String>, fixed: Option<String>) -> FlowSplitResult<AllocationRule> {
    match (percent, fixed) {
        (Some(p), None) => Percentage::parse(&p)
            .map(AllocationRule::Percentage)
            .map_err(|e| {
                FlowSplitError::Validation(format!(
                    "Invalid percentage: '{}'. Use a number like '10' or '12.5'. Error: {}",
                    p, e
                ))
            }),
        (None, Some(f)) => Money::parse(&f).map(AllocationRule::Fixed).map_err(|e| {
            FlowSplitError::Validation(format!(
                "Invalid amount: '{}'. Use format like '900.00' or '900'. Error: {}",
                f, e
            ))
        }),
        _ => Err(FlowSplitError::Validation(
            "Specify exactly one of --percent or --fixed".into(),
        )),
    }
}

/// Handle a bucket command
pub fn handle_bucket_command(storage: &Storage, cmd: BucketCommands) -> FlowSplitResult<()> {
    let service = BucketService::new(storage);

    match cmd {
        BucketCommands::Add {
            name,
            percent,
            fixed,
            link,
            external_name,
            order,
        } => {
            let rule = parse_rule(percent, fixed)?;
            let bucket = service.create(CreateBucketInput {
                name,
                rule,
                external_link: link,
                external_name,
                sort_order: order,
            })?;

            println!("Created bucket: {}", bucket.name);
            println!("  Rule:  {}", bucket.rule);
            println!("  Order: {}", bucket.sort_order);
            if bucket.requires_manual_action() {
                println!("  Transfers to this bucket are completed manually via its link.");
            }
            println!("  ID:    {}", bucket.id);
        }

        BucketCommands::List { all } => {
            let buckets = service.list(all)?;
            print!("{}", format_bucket_list(&buckets));
        }

        BucketCommands::Show { bucket } => {
            let found = service.resolve(&bucket)?;
            print!("{}", format_bucket_details(&found));
        }

        BucketCommands::Deactivate { bucket } => {
            let deactivated = service.deactivate(&bucket)?;
            println!("Deactivated bucket: {}", deactivated.name);
        }

        BucketCommands::Reorder { bucket, order } => {
            let moved = service.reorder(&bucket, order)?;
            println!("Moved {} to position {}", moved.name, moved.sort_order);
        }
    }

    Ok(())
}
