//! Deposit repository for JSON storage
//!
//! Manages loading and saving deposits to deposits.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FlowSplitError;
use crate::models::{Deposit, DepositId, DepositStatus};

use super::file_io::{read_json, write_json_atomic};

/// Serializable deposit data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct DepositData {
    deposits: Vec<Deposit>,
}

/// Repository for deposit persistence
pub struct DepositRepository {
    path: PathBuf,
    data: RwLock<HashMap<DepositId, Deposit>>,
}

impl DepositRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load deposits from disk
    pub fn load(&self) -> Result<(), FlowSplitError> {
        let file_data: DepositData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for deposit in file_data.deposits {
            data.insert(deposit.id, deposit);
        }

        Ok(())
    }

    pub fn get(&self, id: DepositId) -> Result<Option<Deposit>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All deposits, newest first
    pub fn get_all(&self) -> Result<Vec<Deposit>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut deposits: Vec<_> = data.values().cloned().collect();
        deposits.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        Ok(deposits)
    }

    pub fn get_by_status(&self, status: DepositStatus) -> Result<Vec<Deposit>, FlowSplitError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|d| d.status == status)
            .collect())
    }

    /// Find a deposit by full or short ID
    pub fn find(&self, identifier: &str) -> Result<Option<Deposit>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .values()
            .find(|d| d.id.matches_identifier(identifier))
            .cloned())
    }

    /// Insert or update a deposit
    pub fn upsert(&self, deposit: Deposit) -> Result<(), FlowSplitError> {
        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(deposit.id, deposit);
        Ok(())
    }

    /// Upsert a deposit and write only its record to disk
    ///
    /// The file is re-read first, so deposits written by other processes
    /// since we loaded are kept.
    pub fn persist(&self, deposit: &Deposit) -> Result<(), FlowSplitError> {
        let mut on_disk: DepositData = read_json(&self.path)?;
        match on_disk.deposits.iter_mut().find(|d| d.id == deposit.id) {
            Some(existing) => *existing = deposit.clone(),
            None => on_disk.deposits.push(deposit.clone()),
        }
        write_json_atomic(&self.path, &on_disk)?;

        self.upsert(deposit.clone())
    }

    pub fn count(&self) -> Result<usize, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, DepositRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = DepositRepository::new(temp_dir.path().join("deposits.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_persist_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let deposit = Deposit::new(Money::from_dollars(1200)).with_contact("+15550100");
        let id = deposit.id;

        repo.persist(&deposit).unwrap();

        let repo2 = DepositRepository::new(temp_dir.path().join("deposits.json"));
        repo2.load().unwrap();

        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.amount, Money::from_dollars(1200));
        assert_eq!(loaded.contact.as_deref(), Some("+15550100"));
    }

    #[test]
    fn test_find_by_short_id() {
        let (_temp_dir, repo) = create_test_repo();
        let deposit = Deposit::new(Money::from_dollars(5));
        let short = deposit.id.to_string();
        repo.upsert(deposit.clone()).unwrap();

        assert_eq!(repo.find(&short).unwrap().unwrap().id, deposit.id);
        assert!(repo.find("dep-zzzzzzzz").unwrap().is_none());
    }

    #[test]
    fn test_get_by_status() {
        let (_temp_dir, repo) = create_test_repo();
        let pending = Deposit::new(Money::from_dollars(5));
        let mut done = Deposit::new(Money::from_dollars(7));
        done.complete();

        repo.upsert(pending.clone()).unwrap();
        repo.upsert(done).unwrap();

        let found = repo.get_by_status(DepositStatus::Pending).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, pending.id);
    }

    #[test]
    fn test_persist_keeps_other_writers_records() {
        let (temp_dir, repo) = create_test_repo();
        let first = Deposit::new(Money::from_dollars(10));
        let second = Deposit::new(Money::from_dollars(20));
        repo.persist(&first).unwrap();
        repo.persist(&second).unwrap();

        let other = DepositRepository::new(temp_dir.path().join("deposits.json"));
        other.load().unwrap();

        let mut processing = first.clone();
        processing.start_processing();
        repo.persist(&processing).unwrap();

        // other still holds first as pending
        let mut done = second.clone();
        done.complete();
        other.persist(&done).unwrap();

        let reader = DepositRepository::new(temp_dir.path().join("deposits.json"));
        reader.load().unwrap();
        assert_eq!(reader.get(first.id).unwrap().unwrap().status, DepositStatus::Processing);
        assert_eq!(reader.get(second.id).unwrap().unwrap().status, DepositStatus::Completed);
    }
}
