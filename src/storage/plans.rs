//! Split plan repository for JSON storage
//!
//! Manages loading and saving split plans (with their actions) to plans.json.
//! At most one plan exists per deposit. Updates go through [`PlanRepository::commit`],
//! which rejects stale versions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::FlowSplitError;
use crate::models::{DepositId, SplitPlan, SplitPlanId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable plan data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PlanData {
    plans: Vec<SplitPlan>,
}

/// Repository for split plan persistence
pub struct PlanRepository {
    path: PathBuf,
    data: RwLock<HashMap<SplitPlanId, SplitPlan>>,
    /// Index: deposit_id -> plan_id
    by_deposit: RwLock<HashMap<DepositId, SplitPlanId>>,
}

impl PlanRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_deposit: RwLock::new(HashMap::new()),
        }
    }

    /// Load plans from disk
    pub fn load(&self) -> Result<(), FlowSplitError> {
        let file_data: PlanData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_deposit = self.by_deposit.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_deposit.clear();

        for plan in file_data.plans {
            by_deposit.insert(plan.deposit_id, plan.id);
            data.insert(plan.id, plan);
        }

        Ok(())
    }

    pub fn get(&self, id: SplitPlanId) -> Result<Option<SplitPlan>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// The plan for a deposit, if one was created
    pub fn get_by_deposit(&self, deposit_id: DepositId) -> Result<Option<SplitPlan>, FlowSplitError> {
        let plan_id = {
            let by_deposit = self.by_deposit.read().map_err(|e| {
                FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
            })?;
            by_deposit.get(&deposit_id).copied()
        };

        match plan_id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// All plans, newest first
    pub fn get_all(&self) -> Result<Vec<SplitPlan>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut plans: Vec<_> = data.values().cloned().collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    /// Find a plan by full or short ID
    pub fn find(&self, identifier: &str) -> Result<Option<SplitPlan>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .values()
            .find(|p| p.id.matches_identifier(identifier))
            .cloned())
    }

    /// Insert a new plan
    ///
    /// Fails with `Duplicate` if the deposit already has a plan.
    pub fn insert(&self, plan: SplitPlan) -> Result<(), FlowSplitError> {
        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_deposit = self.by_deposit.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if by_deposit.contains_key(&plan.deposit_id) {
            return Err(FlowSplitError::Duplicate {
                entity_type: "Split plan for deposit",
                identifier: plan.deposit_id.to_string(),
            });
        }

        by_deposit.insert(plan.deposit_id, plan.id);
        data.insert(plan.id, plan);
        Ok(())
    }

    /// Insert a new plan and append its record to the file on disk
    ///
    /// A plan for the same deposit written by another process counts as a
    /// duplicate too.
    pub fn create(&self, plan: &SplitPlan) -> Result<(), FlowSplitError> {
        let mut on_disk: PlanData = read_json(&self.path)?;
        if on_disk.plans.iter().any(|p| p.deposit_id == plan.deposit_id) {
            return Err(FlowSplitError::Duplicate {
                entity_type: "Split plan for deposit",
                identifier: plan.deposit_id.to_string(),
            });
        }

        self.insert(plan.clone())?;
        on_disk.plans.push(plan.clone());
        write_json_atomic(&self.path, &on_disk)
    }

    /// Persist an update to an existing plan
    ///
    /// The caller's `version` must match the stored one, both in memory and
    /// in the file on disk (another process may have written since we
    /// loaded). On success the version is bumped and only this plan's record
    /// is replaced in the file; other plans keep whatever is on disk.
    pub fn commit(&self, plan: &mut SplitPlan) -> Result<(), FlowSplitError> {
        let mut on_disk: PlanData = read_json(&self.path)?;
        let disk_index = on_disk.plans.iter().position(|p| p.id == plan.id);
        let disk_version = disk_index.map(|i| on_disk.plans[i].version);

        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let stored = data
            .get(&plan.id)
            .ok_or_else(|| FlowSplitError::plan_not_found(plan.id.to_string()))?;

        let stale = stored.version != plan.version
            || disk_version.is_some_and(|v| v != plan.version);
        if stale {
            return Err(FlowSplitError::Conflict(format!(
                "split plan {} was modified concurrently (have version {}, stored {})",
                plan.id,
                plan.version,
                disk_version.unwrap_or(stored.version)
            )));
        }

        let mut updated = plan.clone();
        updated.version += 1;
        updated.updated_at = Utc::now();

        match disk_index {
            Some(i) => on_disk.plans[i] = updated.clone(),
            None => on_disk.plans.push(updated.clone()),
        }
        write_json_atomic(&self.path, &on_disk)?;

        data.insert(updated.id, updated.clone());
        *plan = updated;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}
