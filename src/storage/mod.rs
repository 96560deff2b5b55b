//! Storage layer for FlowSplit
//!
//! JSON file storage with atomic writes, plus the audit log. [`Storage`] is
//! also the execution engine's [`PlanStore`].

pub mod buckets;
pub mod deposits;
pub mod file_io;
pub mod init;
pub mod plans;

pub use buckets::BucketRepository;
pub use deposits::DepositRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use plans::PlanRepository;

use std::collections::HashMap;

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::FlowSplitPaths;
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::models::{Deposit, SplitPlan, SplitPlanId};
use crate::services::execution::{LoadedPlan, PlanStore};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: FlowSplitPaths,
    pub deposits: DepositRepository,
    pub buckets: BucketRepository,
    pub plans: PlanRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: FlowSplitPaths) -> Result<Self, FlowSplitError> {
        paths.ensure_directories()?;

        Ok(Self {
            deposits: DepositRepository::new(paths.deposits_file()),
            buckets: BucketRepository::new(paths.buckets_file()),
            plans: PlanRepository::new(paths.plans_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &FlowSplitPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), FlowSplitError> {
        self.deposits.load()?;
        self.buckets.load()?;
        self.plans.load()?;
        Ok(())
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FlowSplitResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an update in the audit log
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> FlowSplitResult<()> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

impl PlanStore for Storage {
    fn load_plan(&self, plan_id: SplitPlanId) -> FlowSplitResult<LoadedPlan> {
        let plan = self
            .plans
            .get(plan_id)?
            .ok_or_else(|| FlowSplitError::plan_not_found(plan_id.to_string()))?;
        let deposit = self
            .deposits
            .get(plan.deposit_id)?
            .ok_or_else(|| FlowSplitError::deposit_not_found(plan.deposit_id.to_string()))?;

        let mut buckets = HashMap::new();
        for action in &plan.actions {
            if let Some(bucket) = self.buckets.get(action.bucket_id)? {
                buckets.insert(bucket.id, bucket);
            }
        }

        Ok(LoadedPlan {
            plan,
            deposit,
            buckets,
        })
    }

    fn commit_plan(&self, plan: &mut SplitPlan) -> FlowSplitResult<()> {
        let before = self.plans.get(plan.id)?;
        self.plans.commit(plan)?;

        if let Some(before) = before {
            self.log_update(EntityType::SplitPlan, plan.id.to_string(), None, &before, &*plan)?;
        }
        Ok(())
    }

    fn commit_deposit(&self, deposit: &Deposit) -> FlowSplitResult<()> {
        let before = self.deposits.get(deposit.id)?;
        self.deposits.persist(deposit)?;

        match before {
            Some(before) => self.log_update(
                EntityType::Deposit,
                deposit.id.to_string(),
                None,
                &before,
                deposit,
            ),
            None => self.log_create(EntityType::Deposit, deposit.id.to_string(), None, deposit),
        }
    }
}
