//! Deposit service
//!
//! Records incoming deposits and looks them up.

use tracing::info;

use crate::audit::EntityType;
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::{Deposit, DepositId, DepositStatus, Money};
use crate::storage::Storage;

/// Input for recording a deposit
#[derive(Debug, Clone, Default)]
pub struct RecordDepositInput {
    pub amount: Money,
    pub source: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
}

/// Service for deposit management
pub struct DepositService<'a> {
    storage: &'a Storage,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<'a> DepositService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new pending deposit
    pub fn record(&self, input: RecordDepositInput) -> FlowSplitResult<Deposit> {
        let mut deposit = Deposit::new(input.amount);
        deposit.source = non_blank(input.source);
        deposit.description = non_blank(input.description);
        deposit.contact = non_blank(input.contact);

        deposit
            .validate()
            .map_err(|e| FlowSplitError::Validation(e.to_string()))?;

        self.storage.deposits.persist(&deposit)?;

        self.storage.log_create(
            EntityType::Deposit,
            deposit.id.to_string(),
            deposit.source.clone(),
            &deposit,
        )?;

        info!(deposit = %deposit.id, amount = %deposit.amount, "deposit recorded");
        Ok(deposit)
    }

    pub fn get(&self, id: DepositId) -> FlowSplitResult<Option<Deposit>> {
        self.storage.deposits.get(id)
    }

    /// Find a deposit by full or short ID
    pub fn find(&self, identifier: &str) -> FlowSplitResult<Option<Deposit>> {
        self.storage.deposits.find(identifier)
    }

    /// Like [`find`](Self::find), but a missing deposit is an error
    pub fn resolve(&self, identifier: &str) -> FlowSplitResult<Deposit> {
        self.find(identifier)?
            .ok_or_else(|| FlowSplitError::deposit_not_found(identifier))
    }

    /// Deposits, newest first
    pub fn list(&self, pending_only: bool) -> FlowSplitResult<Vec<Deposit>> {
        if pending_only {
            self.storage.deposits.get_by_status(DepositStatus::Pending)
        } else {
            self.storage.deposits.get_all()
        }
    }
}
