//! External collaborators consumed by the execution engine
//!
//! The engine never talks to a bank or an SMS provider directly. It receives
//! a [`TransferGateway`] and a [`NotificationGateway`] at construction.
//!
//! - `simulated`: a transfer gateway that accepts every transfer and renders
//!   payment links from bucket templates
//! - `outbox`: a notifier that appends messages to a JSONL outbox file
//! - `doubles`: scripted gateways for tests

pub mod doubles;
pub mod outbox;
pub mod simulated;

use std::future::Future;

use thiserror::Error;

use crate::models::{BucketId, DepositId, Money};

pub use doubles::{RecordingNotifier, Scripted, ScriptedTransferGateway, SentNotification};
pub use outbox::{OutboxMessage, OutboxNotifier};
pub use simulated::{render_link, SimulatedTransferGateway};

/// One transfer of money from a deposit to a bucket's destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub bucket_id: BucketId,
    pub amount: Money,
    pub deposit_id: DepositId,
}

/// What the transfer gateway said about a transfer it received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The money moved; `transaction_id` references it at the provider
    Accepted { transaction_id: String },
    /// The provider refused the transfer
    Rejected { reason: String },
}

/// The gateway could not be reached or did not answer properly
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("gateway timed out")]
    Timeout,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Performs transfers or produces manual payment links
pub trait TransferGateway: Send + Sync {
    /// Move `request.amount` to the bucket's destination
    fn execute_transfer(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<TransferOutcome, GatewayError>> + Send;

    /// Build the link the user follows to complete a manual transfer
    fn generate_external_link(
        &self,
        request: &TransferRequest,
        template: &str,
    ) -> impl Future<Output = String> + Send;
}

/// Tells the user how an execution pass went. Best effort.
pub trait NotificationGateway: Send + Sync {
    fn notify_completed(
        &self,
        contact: &str,
        amount: Money,
        bucket_count: usize,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn notify_manual_action_required(
        &self,
        contact: &str,
        amount: Money,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn notify_partial_failure(
        &self,
        contact: &str,
        completed_amount: Money,
        failed_amount: Money,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
