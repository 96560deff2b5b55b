//! File outbox notifier
//!
//! Renders user notifications and appends them to a line-delimited JSON
//! outbox. A delivery worker (SMS, push) drains the outbox; delivery itself is
//! outside this crate.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::{GatewayError, NotificationGateway};
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::Money;

/// Kind of notification in the outbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    SplitCompleted,
    ManualActionRequired,
    PartialFailure,
}

/// A rendered notification waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub created_at: DateTime<Utc>,
    pub kind: MessageKind,
    pub contact: String,
    pub body: String,
}

/// Notification gateway writing to a JSONL outbox file
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read every message in the outbox, oldest first
    pub fn read_all(&self) -> FlowSplitResult<Vec<OutboxMessage>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)
            .map_err(|e| FlowSplitError::Io(format!("Failed to open outbox: {}", e)))?;

        let mut messages = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                FlowSplitError::Io(format!("Failed to read outbox line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let message: OutboxMessage = serde_json::from_str(&line).map_err(|e| {
                FlowSplitError::Json(format!(
                    "Failed to parse outbox message at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            messages.push(message);
        }

        Ok(messages)
    }

    async fn append(&self, kind: MessageKind, contact: &str, body: String) -> Result<(), GatewayError> {
        let message = OutboxMessage {
            created_at: Utc::now(),
            kind,
            contact: contact.to_string(),
            body,
        };
        let mut line = serde_json::to_string(&message)
            .map_err(|e| GatewayError::Delivery(format!("Failed to serialize message: {}", e)))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| GatewayError::Delivery(format!("Failed to open outbox: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| GatewayError::Delivery(format!("Failed to write outbox: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| GatewayError::Delivery(format!("Failed to flush outbox: {}", e)))?;

        info!(kind = ?kind, contact = %mask_contact(contact), "notification queued");
        Ok(())
    }
}

impl NotificationGateway for OutboxNotifier {
    async fn notify_completed(
        &self,
        contact: &str,
        amount: Money,
        bucket_count: usize,
    ) -> Result<(), GatewayError> {
        self.append(
            MessageKind::SplitCompleted,
            contact,
            completed_message(amount, bucket_count),
        )
        .await
    }

    async fn notify_manual_action_required(
        &self,
        contact: &str,
        amount: Money,
    ) -> Result<(), GatewayError> {
        self.append(
            MessageKind::ManualActionRequired,
            contact,
            manual_action_message(amount),
        )
        .await
    }

    async fn notify_partial_failure(
        &self,
        contact: &str,
        completed_amount: Money,
        failed_amount: Money,
    ) -> Result<(), GatewayError> {
        self.append(
            MessageKind::PartialFailure,
            contact,
            partial_failure_message(completed_amount, failed_amount),
        )
        .await
    }
}

pub fn completed_message(amount: Money, bucket_count: usize) -> String {
    format!(
        "FlowSplit: Your {} deposit has been split across {} buckets. View details in the app.",
        amount, bucket_count
    )
}

pub fn manual_action_message(amount: Money) -> String {
    format!(
        "FlowSplit: Action needed! {} is ready for giving. Open the app to complete your transfer.",
        amount
    )
}

pub fn partial_failure_message(completed_amount: Money, failed_amount: Money) -> String {
    format!(
        "FlowSplit: {} was successfully distributed. {} could not be transferred. \
         Open the app to retry or adjust your split.",
        completed_amount, failed_amount
    )
}

/// Keep logs free of full phone numbers
fn mask_contact(contact: &str) -> String {
    let visible: String = contact.chars().take(6).collect();
    if contact.chars().count() > 6 {
        format!("{}...", visible)
    } else {
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_messages() {
        assert_eq!(
            completed_message(Money::from_dollars(1200), 3),
            "FlowSplit: Your $1200.00 deposit has been split across 3 buckets. View details in the app."
        );
        assert!(partial_failure_message(Money::from_dollars(120), Money::from_dollars(180))
            .starts_with("FlowSplit: $120.00 was successfully distributed. $180.00 could not"));
        assert!(manual_action_message(Money::from_cents(5)).contains("$0.05"));
    }

    #[test]
    fn test_mask_contact() {
        assert_eq!(mask_contact("+15550100"), "+15550...");
        assert_eq!(mask_contact("abc"), "abc");
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let notifier = OutboxNotifier::new(temp_dir.path().join("outbox.jsonl"));

        assert!(notifier.read_all().unwrap().is_empty());

        notifier
            .notify_completed("+15550100", Money::from_dollars(100), 2)
            .await
            .unwrap();
        notifier
            .notify_partial_failure("+15550100", Money::from_dollars(60), Money::from_dollars(40))
            .await
            .unwrap();

        let messages = notifier.read_all().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::SplitCompleted);
        assert_eq!(messages[1].kind, MessageKind::PartialFailure);
        assert_eq!(messages[1].contact, "+15550100");
    }

    #[tokio::test]
    async fn test_unwritable_outbox_reports_delivery_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let notifier = OutboxNotifier::new(temp_dir.path().to_path_buf());

        let err = notifier
            .notify_manual_action_required("+15550100", Money::from_dollars(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Delivery(_)));
    }
}
