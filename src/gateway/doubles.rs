//! Scripted gateways for tests
//!
//! [`ScriptedTransferGateway`] answers each transfer from a per-bucket queue
//! of scripted outcomes (accepting once a queue runs dry) and records every
//! call. [`RecordingNotifier`] records notifications and can be told to fail.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{
    render_link, GatewayError, NotificationGateway, TransferGateway, TransferOutcome,
    TransferRequest,
};
use crate::models::{BucketId, Money};

/// One scripted response to a transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Accept,
    Reject(String),
    TransportError(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct ScriptedTransferGateway {
    scripts: Mutex<HashMap<BucketId, VecDeque<Scripted>>>,
    transfer_calls: Mutex<Vec<TransferRequest>>,
    link_calls: Mutex<Vec<TransferRequest>>,
    next_id: AtomicU64,
}

impl ScriptedTransferGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for a bucket's next transfer attempts
    pub fn script(&self, bucket_id: BucketId, outcomes: impl IntoIterator<Item = Scripted>) {
        lock(&self.scripts)
            .entry(bucket_id)
            .or_default()
            .extend(outcomes);
    }

    /// Reject the next `attempts` transfers to a bucket
    pub fn reject_next(&self, bucket_id: BucketId, attempts: usize) {
        self.script(
            bucket_id,
            (0..attempts).map(|i| Scripted::Reject(format!("insufficient funds (attempt {})", i + 1))),
        );
    }

    /// Every transfer request received, in order
    pub fn transfer_calls(&self) -> Vec<TransferRequest> {
        lock(&self.transfer_calls).clone()
    }

    /// Transfer attempts made for one bucket
    pub fn attempts_for(&self, bucket_id: BucketId) -> usize {
        lock(&self.transfer_calls)
            .iter()
            .filter(|r| r.bucket_id == bucket_id)
            .count()
    }

    /// Every payment link request received, in order
    pub fn link_calls(&self) -> Vec<TransferRequest> {
        lock(&self.link_calls).clone()
    }

    /// Total gateway calls of either kind
    pub fn total_calls(&self) -> usize {
        lock(&self.transfer_calls).len() + lock(&self.link_calls).len()
    }
}

impl TransferGateway for ScriptedTransferGateway {
    async fn execute_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, GatewayError> {
        lock(&self.transfer_calls).push(request.clone());
        let next = lock(&self.scripts)
            .get_mut(&request.bucket_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Scripted::Accept);

        match next {
            Scripted::Accept => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(TransferOutcome::Accepted {
                    transaction_id: format!("txn_test_{:04}", n),
                })
            }
            Scripted::Reject(reason) => Ok(TransferOutcome::Rejected { reason }),
            Scripted::TransportError(msg) => Err(GatewayError::Transport(msg)),
        }
    }

    async fn generate_external_link(&self, request: &TransferRequest, template: &str) -> String {
        lock(&self.link_calls).push(request.clone());
        render_link(template, request, "https://flowsplit.test/pay")
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    Completed {
        contact: String,
        amount: Money,
        bucket_count: usize,
    },
    ManualActionRequired {
        contact: String,
        amount: Money,
    },
    PartialFailure {
        contact: String,
        completed_amount: Money,
        failed_amount: Money,
    },
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails (after recording the attempt)
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::Relaxed);
        notifier
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    fn record(&self, notification: SentNotification) -> Result<(), GatewayError> {
        lock(&self.sent).push(notification);
        if self.fail.load(Ordering::Relaxed) {
            Err(GatewayError::Delivery("sms provider unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl NotificationGateway for RecordingNotifier {
    async fn notify_completed(
        &self,
        contact: &str,
        amount: Money,
        bucket_count: usize,
    ) -> Result<(), GatewayError> {
        self.record(SentNotification::Completed {
            contact: contact.to_string(),
            amount,
            bucket_count,
        })
    }

    async fn notify_manual_action_required(
        &self,
        contact: &str,
        amount: Money,
    ) -> Result<(), GatewayError> {
        self.record(SentNotification::ManualActionRequired {
            contact: contact.to_string(),
            amount,
        })
    }

    async fn notify_partial_failure(
        &self,
        contact: &str,
        completed_amount: Money,
        failed_amount: Money,
    ) -> Result<(), GatewayError> {
        self.record(SentNotification::PartialFailure {
            contact: contact.to_string(),
            completed_amount,
            failed_amount,
        })
    }
}
