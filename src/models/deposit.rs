//! Deposit model
//!
//! A deposit is money detected as received and waiting to be split. Its status
//! follows `pending -> processing -> completed | failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::DepositId;
use super::money::Money;

/// Lifecycle status of a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    /// Detected, no execution has started
    #[default]
    Pending,
    /// A split plan for this deposit is executing (or partially failed)
    Processing,
    /// Every split action resolved
    Completed,
    /// The split was abandoned
    Failed,
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A received amount of money subject to being split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,

    /// Amount received (always positive)
    pub amount: Money,

    /// Where the money came from (e.g. "ACME Payroll")
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Where outcome notifications go (phone number, push token, ...)
    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub status: DepositStatus,

    pub detected_at: DateTime<Utc>,

    /// When the split for this deposit completed
    pub processed_at: Option<DateTime<Utc>>,
}

impl Deposit {
    /// Create a new pending deposit
    pub fn new(amount: Money) -> Self {
        Self {
            id: DepositId::new(),
            amount,
            source: None,
            description: None,
            contact: None,
            status: DepositStatus::Pending,
            detected_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Set the notification contact
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Set the source description
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == DepositStatus::Pending
    }

    /// Mark the deposit as being processed by a split plan
    pub fn start_processing(&mut self) {
        self.status = DepositStatus::Processing;
    }

    /// Mark the deposit as fully processed
    pub fn complete(&mut self) {
        self.status = DepositStatus::Completed;
        self.processed_at = Some(Utc::now());
    }

    /// Mark the deposit as failed (its plan was abandoned mid-execution)
    pub fn fail(&mut self) {
        self.status = DepositStatus::Failed;
    }

    /// Validate the deposit
    pub fn validate(&self) -> Result<(), DepositValidationError> {
        if !self.amount.is_positive() {
            return Err(DepositValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

impl fmt::Display for Deposit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} from {} ({})", self.amount, source, self.status),
            None => write!(f, "{} ({})", self.amount, self.status),
        }
    }
}

/// Validation errors for deposits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepositValidationError {
    #[error("Deposit amount must be positive, got {0}")]
    NonPositiveAmount(Money),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deposit() {
        let deposit = Deposit::new(Money::from_dollars(1200)).with_contact("+15550100");
        assert!(deposit.is_pending());
        assert_eq!(deposit.contact.as_deref(), Some("+15550100"));
        assert!(deposit.processed_at.is_none());
    }

    #[test]
    fn test_lifecycle() {
        let mut deposit = Deposit::new(Money::from_dollars(50));
        deposit.start_processing();
        assert_eq!(deposit.status, DepositStatus::Processing);

        deposit.complete();
        assert_eq!(deposit.status, DepositStatus::Completed);
        assert!(deposit.processed_at.is_some());
    }

    #[test]
    fn test_validation() {
        assert!(Deposit::new(Money::from_cents(1)).validate().is_ok());
        assert_eq!(
            Deposit::new(Money::zero()).validate(),
            Err(DepositValidationError::NonPositiveAmount(Money::zero()))
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DepositStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_display() {
        let deposit = Deposit::new(Money::from_dollars(10)).with_source("Payroll");
        assert_eq!(deposit.to_string(), "$10.00 from Payroll (pending)");
    }
}
