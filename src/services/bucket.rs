//! Bucket service
//!
//! Creates, lists, reorders and deactivates split destinations. Only active
//! buckets, in `sort_order`, take part in allocation.

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::{AllocationRule, Bucket, BucketId};
use crate::storage::Storage;

/// Input for creating a bucket
#[derive(Debug, Clone)]
pub struct CreateBucketInput {
    pub name: String,
    pub rule: AllocationRule,
    /// Payment link template; makes the bucket manual
    pub external_link: Option<String>,
    pub external_name: Option<String>,
    /// Defaults to one past the current maximum
    pub sort_order: Option<i32>,
}

/// Service for bucket management
pub struct BucketService<'a> {
    storage: &'a Storage,
}

impl<'a> BucketService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new bucket
    pub fn create(&self, input: CreateBucketInput) -> FlowSplitResult<Bucket> {
        let name = input.name.trim();

        if self.storage.buckets.get_by_name(name)?.is_some() {
            return Err(FlowSplitError::Duplicate {
                entity_type: "Bucket",
                identifier: name.to_string(),
            });
        }

        let sort_order = match input.sort_order {
            Some(order) => order,
            None => self.storage.buckets.next_sort_order()?,
        };

        let mut bucket = Bucket::new(name, input.rule).with_sort_order(sort_order);
        bucket.external_link = input
            .external_link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        bucket.external_name = input.external_name;

        bucket
            .validate()
            .map_err(|e| FlowSplitError::Validation(e.to_string()))?;

        self.storage.buckets.persist(&bucket)?;

        self.storage.log_create(
            EntityType::Bucket,
            bucket.id.to_string(),
            Some(bucket.name.clone()),
            &bucket,
        )?;

        info!(bucket = %bucket.id, name = %bucket.name, rule = %bucket.rule, "bucket created");
        Ok(bucket)
    }

    pub fn get(&self, id: BucketId) -> FlowSplitResult<Option<Bucket>> {
        self.storage.buckets.get(id)
    }

    /// Find a bucket by name or ID
    pub fn find(&self, identifier: &str) -> FlowSplitResult<Option<Bucket>> {
        if let Some(bucket) = self.storage.buckets.get_by_name(identifier)? {
            return Ok(Some(bucket));
        }

        Ok(self
            .storage
            .buckets
            .get_all()?
            .into_iter()
            .find(|b| b.id.matches_identifier(identifier)))
    }

    pub fn resolve(&self, identifier: &str) -> FlowSplitResult<Bucket> {
        self.find(identifier)?
            .ok_or_else(|| FlowSplitError::bucket_not_found(identifier))
    }

    /// Buckets in display order
    pub fn list(&self, include_inactive: bool) -> FlowSplitResult<Vec<Bucket>> {
        if include_inactive {
            self.storage.buckets.get_all()
        } else {
            self.storage.buckets.get_active()
        }
    }

    /// Soft-delete a bucket; existing plans keep referring to it
    pub fn deactivate(&self, identifier: &str) -> FlowSplitResult<Bucket> {
        let before = self.resolve(identifier)?;
        if !before.active {
            return Ok(before);
        }

        let mut bucket = before.clone();
        bucket.deactivate();
        self.save_update(&before, &bucket)?;

        info!(bucket = %bucket.id, name = %bucket.name, "bucket deactivated");
        Ok(bucket)
    }

    /// Move a bucket to a new position in allocation order
    pub fn reorder(&self, identifier: &str, sort_order: i32) -> FlowSplitResult<Bucket> {
        let before = self.resolve(identifier)?;

        let mut bucket = before.clone();
        bucket.sort_order = sort_order;
        bucket.updated_at = Utc::now();
        self.save_update(&before, &bucket)?;

        Ok(bucket)
    }

    fn save_update(&self, before: &Bucket, after: &Bucket) -> FlowSplitResult<()> {
        self.storage.buckets.persist(after)?;
        self.storage.log_update(
            EntityType::Bucket,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
        )
    }
}
