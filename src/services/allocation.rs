//! Allocation calculator
//!
//! Splits a deposit total across an ordered list of buckets:
//!
//! 1. Fixed buckets, in order, each take `min(value, remaining)`.
//! 2. Percentage buckets share what is left. If their percentages sum above
//!    100 they are normalized to sum to exactly 100; otherwise they apply as
//!    written and the unclaimed part is reported as unallocated.
//! 3. Rounding drift of more than one cent is folded into the first bucket
//!    that received money.
//!
//! The calculator is pure: no I/O, inputs are never mutated, and the same
//! input order always yields the same result.

use serde::{Deserialize, Serialize};

use crate::models::money::ONE_CENT;
use crate::models::{AllocationRule, Bucket, BucketId, Money, Percentage};

/// What happens to money no bucket claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Keep it out of every bucket and report it as unallocated
    #[default]
    Unallocated,
    /// Fold it into the first bucket that received an allocation
    FirstBucket,
}

/// Result of allocating a deposit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    /// Per-bucket amounts in allocation order (fixed buckets first)
    pub amounts: Vec<(BucketId, Money)>,
    /// Part of the total that no bucket claimed
    pub unallocated: Money,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Sum of all bucket amounts
    pub fn allocated(&self) -> Money {
        self.amounts.iter().map(|(_, amount)| *amount).sum()
    }

    /// Amount allocated to a bucket, if any
    pub fn get(&self, bucket_id: BucketId) -> Option<Money> {
        self.amounts
            .iter()
            .find(|(id, _)| *id == bucket_id)
            .map(|(_, amount)| *amount)
    }
}

/// Split `total` across `buckets`
///
/// `buckets` should already be filtered to active ones and sorted by
/// `sort_order`; within each rule type that order is preserved.
pub fn allocate(total: Money, buckets: &[Bucket], policy: RemainderPolicy) -> Allocation {
    if !total.is_positive() {
        return Allocation::default();
    }
    if buckets.is_empty() {
        return Allocation {
            amounts: Vec::new(),
            unallocated: total,
        };
    }

    let mut amounts: Vec<(BucketId, Money)> = Vec::new();
    let mut remaining = total;

    for bucket in buckets {
        if let AllocationRule::Fixed(value) = bucket.rule {
            let amount = value.min(remaining);
            if amount.is_positive() {
                amounts.push((bucket.id, amount));
                remaining -= amount;
            }
        }
    }

    let percentage_buckets: Vec<(BucketId, Percentage)> = buckets
        .iter()
        .filter_map(|b| match b.rule {
            AllocationRule::Percentage(p) => Some((b.id, p)),
            AllocationRule::Fixed(_) => None,
        })
        .collect();
    let total_percentage: Percentage = percentage_buckets.iter().map(|(_, p)| *p).sum();
    let normalize = total_percentage > Percentage::HUNDRED;

    if total_percentage.is_positive() && remaining.is_positive() {
        for (bucket_id, percentage) in &percentage_buckets {
            let share = if normalize {
                percentage.apply_normalized(total_percentage, remaining)
            } else {
                percentage.apply(remaining)
            };
            if share.is_positive() {
                amounts.push((*bucket_id, share));
            }
        }
    }

    let intended_unallocated = match policy {
        RemainderPolicy::FirstBucket => Money::zero(),
        RemainderPolicy::Unallocated => {
            unclaimed_remainder(remaining, total_percentage)
        }
    };

    if amounts.is_empty() {
        return Allocation {
            amounts,
            unallocated: total,
        };
    }

    let accounted = amounts.iter().map(|(_, a)| *a).sum::<Money>() + intended_unallocated;
    let difference = total - accounted;
    if difference.abs() > ONE_CENT {
        // First bucket that stays positive after absorbing the difference
        if let Some((_, amount)) = amounts
            .iter_mut()
            .find(|(_, amount)| (*amount + difference).is_positive())
        {
            *amount += difference;
        }
    }

    Allocation {
        amounts,
        unallocated: intended_unallocated,
    }
}

/// The part of `remaining` that percentage buckets do not claim
fn unclaimed_remainder(remaining: Money, total_percentage: Percentage) -> Money {
    if !remaining.is_positive() {
        return Money::zero();
    }
    if !total_percentage.is_positive() {
        return remaining;
    }
    if total_percentage >= Percentage::HUNDRED {
        return Money::zero();
    }
    remaining - total_percentage.apply(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(name: &str, points: i64) -> Bucket {
        Bucket::percentage(name, Percentage::from_points(points))
    }

    fn fixed(name: &str, dollars: i64) -> Bucket {
        Bucket::fixed(name, Money::from_dollars(dollars))
    }

    #[test]
    fn test_empty_buckets() {
        let result = allocate(Money::from_dollars(100), &[], RemainderPolicy::Unallocated);
        assert!(result.is_empty());
        assert_eq!(result.unallocated, Money::from_dollars(100));
    }

    #[test]
    fn test_pure_percentage_leaves_remainder_unallocated() {
        let buckets = vec![pct("Tithe", 10), pct("Savings", 15), pct("Investing", 10)];
        let result = allocate(Money::from_dollars(1200), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.get(buckets[0].id), Some(Money::from_dollars(120)));
        assert_eq!(result.get(buckets[1].id), Some(Money::from_dollars(180)));
        assert_eq!(result.get(buckets[2].id), Some(Money::from_dollars(120)));
        assert_eq!(result.allocated(), Money::from_dollars(420));
        assert_eq!(result.unallocated, Money::from_dollars(780));
    }

    #[test]
    fn test_fixed_then_normalized_percentages() {
        let buckets = vec![fixed("Rent", 100), pct("A", 60), pct("B", 60)];
        let result = allocate(Money::from_dollars(500), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.get(buckets[0].id), Some(Money::from_dollars(100)));
        assert_eq!(result.get(buckets[1].id), Some(Money::from_dollars(200)));
        assert_eq!(result.get(buckets[2].id), Some(Money::from_dollars(200)));
        assert_eq!(result.allocated(), Money::from_dollars(500));
        assert!(result.unallocated.is_zero());
    }

    #[test]
    fn test_fixed_funded_first_regardless_of_input_order() {
        let buckets = vec![pct("Half", 50), fixed("Rent", 100)];
        let result = allocate(Money::from_dollars(300), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.amounts[0], (buckets[1].id, Money::from_dollars(100)));
        assert_eq!(result.amounts[1], (buckets[0].id, Money::from_dollars(100)));
        assert_eq!(result.unallocated, Money::from_dollars(100));
    }

    #[test]
    fn test_fixed_capped_by_remaining() {
        let buckets = vec![fixed("Rent", 80), fixed("Car", 50), pct("Savings", 100)];
        let result = allocate(Money::from_dollars(100), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.get(buckets[0].id), Some(Money::from_dollars(80)));
        assert_eq!(result.get(buckets[1].id), Some(Money::from_dollars(20)));
        // Nothing left for the percentage bucket
        assert_eq!(result.get(buckets[2].id), None);
        assert_eq!(result.allocated(), Money::from_dollars(100));
    }

    #[test]
    fn test_zero_value_buckets_are_omitted() {
        let buckets = vec![fixed("Nothing", 0), pct("Zero", 0), pct("All", 100)];
        let result = allocate(Money::from_dollars(10), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.amounts.len(), 1);
        assert_eq!(result.get(buckets[2].id), Some(Money::from_dollars(10)));
    }

    #[test]
    fn test_rounding_drift_goes_to_first_bucket() {
        // Six buckets at 50% normalize to 1/6 each: 16.67c rounds to 17c,
        // six of them overshoot $1.00 by 2c.
        let buckets: Vec<_> = (0..6).map(|i| pct(&format!("B{}", i), 50)).collect();
        let result = allocate(Money::from_dollars(1), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.amounts[0].1, Money::from_cents(15));
        for (_, amount) in &result.amounts[1..] {
            assert_eq!(*amount, Money::from_cents(17));
        }
        assert_eq!(result.allocated(), Money::from_dollars(1));
    }

    #[test]
    fn test_one_cent_drift_is_tolerated() {
        // Three thirds of $100.00 are $33.33 each
        let buckets = vec![pct("A", 50), pct("B", 50), pct("C", 50)];
        let result = allocate(Money::from_dollars(100), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.allocated(), Money::from_cents(9999));
        assert!(result.unallocated.is_zero());
    }

    #[test]
    fn test_first_bucket_policy_folds_remainder() {
        let buckets = vec![pct("Tithe", 10), pct("Savings", 15), pct("Investing", 10)];
        let result = allocate(Money::from_dollars(1200), &buckets, RemainderPolicy::FirstBucket);

        assert_eq!(result.get(buckets[0].id), Some(Money::from_dollars(900)));
        assert_eq!(result.allocated(), Money::from_dollars(1200));
        assert!(result.unallocated.is_zero());
    }

    #[test]
    fn test_fixed_with_low_percentages_tracks_remainder() {
        let buckets = vec![fixed("Rent", 100), pct("Savings", 50)];
        let result = allocate(Money::from_dollars(500), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(result.get(buckets[1].id), Some(Money::from_dollars(200)));
        assert_eq!(result.unallocated, Money::from_dollars(200));
        assert_eq!(result.allocated() + result.unallocated, Money::from_dollars(500));
    }

    #[test]
    fn test_inputs_untouched_and_deterministic() {
        let buckets = vec![fixed("Rent", 100), pct("A", 33), pct("B", 33)];
        let snapshot: Vec<_> = buckets.iter().map(|b| (b.id, b.rule)).collect();

        let first = allocate(Money::from_cents(123_45), &buckets, RemainderPolicy::Unallocated);
        let second = allocate(Money::from_cents(123_45), &buckets, RemainderPolicy::Unallocated);

        assert_eq!(first, second);
        let after: Vec<_> = buckets.iter().map(|b| (b.id, b.rule)).collect();
        assert_eq!(snapshot, after);
        assert!(first.amounts.iter().all(|(_, a)| a.is_positive()));
    }

    #[test]
    fn test_sum_property_over_many_totals() {
        let buckets = vec![fixed("Rent", 37), pct("A", 45), pct("B", 35), pct("C", 40)];
        for cents in [1, 99, 3_700, 3_701, 10_001, 123_456, 9_999_999] {
            let total = Money::from_cents(cents);
            let result = allocate(total, &buckets, RemainderPolicy::Unallocated);
            let accounted = result.allocated() + result.unallocated;
            assert!(
                (total - accounted).abs() <= ONE_CENT,
                "total {} accounted {}",
                total,
                accounted
            );
            assert!(result.amounts.iter().all(|(_, a)| a.is_positive()));
        }
    }
}
