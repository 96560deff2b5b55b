//! Bucket model
//!
//! A bucket is a user-configured destination for part of every deposit. It
//! takes either a fixed amount or a percentage of what is left after fixed
//! buckets are funded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BucketId;
use super::money::Money;
use super::percentage::Percentage;

/// How a bucket claims its share of a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AllocationRule {
    /// A share of the remainder left after fixed buckets
    Percentage(Percentage),
    /// Up to this amount, funded before any percentage bucket
    Fixed(Money),
}

impl fmt::Display for AllocationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage(p) => write!(f, "{}", p),
            Self::Fixed(m) => write!(f, "{} fixed", m),
        }
    }
}

/// A destination for split deposits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: BucketId,

    /// Display name (e.g. "Tithe")
    pub name: String,

    pub rule: AllocationRule,

    /// Payment link template for destinations that cannot be paid
    /// programmatically. Its presence makes every action for this bucket a
    /// manual action.
    #[serde(default)]
    pub external_link: Option<String>,

    /// Human name of the external destination (e.g. "Pushpay")
    #[serde(default)]
    pub external_name: Option<String>,

    /// Display and allocation order within each rule type
    #[serde(default)]
    pub sort_order: i32,

    /// Inactive buckets are ignored by the allocator
    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Bucket {
    /// Create a new active bucket
    pub fn new(name: impl Into<String>, rule: AllocationRule) -> Self {
        let now = Utc::now();
        Self {
            id: BucketId::new(),
            name: name.into(),
            rule,
            external_link: None,
            external_name: None,
            sort_order: 0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a percentage bucket
    pub fn percentage(name: impl Into<String>, percentage: Percentage) -> Self {
        Self::new(name, AllocationRule::Percentage(percentage))
    }

    /// Create a fixed-amount bucket
    pub fn fixed(name: impl Into<String>, amount: Money) -> Self {
        Self::new(name, AllocationRule::Fixed(amount))
    }

    /// Route this bucket through a manual payment link
    pub fn with_external_link(mut self, template: impl Into<String>) -> Self {
        self.external_link = Some(template.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Check if transfers to this bucket must be completed by the user
    pub fn requires_manual_action(&self) -> bool {
        self.external_link
            .as_deref()
            .is_some_and(|link| !link.trim().is_empty())
    }

    /// Soft-delete this bucket
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Validate the bucket
    pub fn validate(&self) -> Result<(), BucketValidationError> {
        if self.name.trim().is_empty() {
            return Err(BucketValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(BucketValidationError::NameTooLong(self.name.len()));
        }

        match self.rule {
            AllocationRule::Percentage(p) if p.is_negative() => {
                Err(BucketValidationError::NegativeAllocation)
            }
            AllocationRule::Fixed(m) if m.is_negative() => {
                Err(BucketValidationError::NegativeAllocation)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.rule)
    }
}

/// Validation errors for buckets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BucketValidationError {
    #[error("Bucket name cannot be empty")]
    EmptyName,
    #[error("Bucket name too long ({0} chars, max 100)")]
    NameTooLong(usize),
    #[error("Allocation value cannot be negative")]
    NegativeAllocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bucket() {
        let bucket = Bucket::percentage("Savings", Percentage::from_points(15));
        assert!(bucket.active);
        assert!(matches!(bucket.rule, AllocationRule::Percentage(_)));
        assert!(!bucket.requires_manual_action());
    }

    #[test]
    fn test_manual_bucket() {
        let bucket = Bucket::percentage("Tithe", Percentage::from_points(10))
            .with_external_link("https://pushpay.com/g/church");
        assert!(bucket.requires_manual_action());

        let blank = Bucket::fixed("Rent", Money::from_dollars(100)).with_external_link("  ");
        assert!(!blank.requires_manual_action());
    }

    #[test]
    fn test_validation() {
        let mut bucket = Bucket::fixed("Rent", Money::from_dollars(100));
        assert!(bucket.validate().is_ok());

        bucket.name = String::new();
        assert_eq!(bucket.validate(), Err(BucketValidationError::EmptyName));

        bucket.name = "a".repeat(101);
        assert!(matches!(
            bucket.validate(),
            Err(BucketValidationError::NameTooLong(101))
        ));

        let negative = Bucket::fixed("Oops", Money::from_cents(-1));
        assert_eq!(
            negative.validate(),
            Err(BucketValidationError::NegativeAllocation)
        );
    }

    #[test]
    fn test_rule_serialization() {
        let rule = AllocationRule::Fixed(Money::from_dollars(100));
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"type":"fixed","value":10000}"#);

        let rule: AllocationRule =
            serde_json::from_str(r#"{"type":"percentage","value":1250}"#).unwrap();
        assert_eq!(rule, AllocationRule::Percentage(Percentage::from_hundredths(1250)));
    }

    #[test]
    fn test_display() {
        let bucket = Bucket::percentage("Savings", Percentage::from_points(15));
        assert_eq!(bucket.to_string(), "Savings (15%)");
    }
}
