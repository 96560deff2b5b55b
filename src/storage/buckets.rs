//! Bucket repository for JSON storage
//!
//! Manages loading and saving buckets to buckets.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FlowSplitError;
use crate::models::{Bucket, BucketId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable bucket data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BucketData {
    buckets: Vec<Bucket>,
}

/// Repository for bucket persistence
pub struct BucketRepository {
    path: PathBuf,
    data: RwLock<HashMap<BucketId, Bucket>>,
}

fn by_display_order(a: &Bucket, b: &Bucket) -> std::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

impl BucketRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load buckets from disk
    pub fn load(&self) -> Result<(), FlowSplitError> {
        let file_data: BucketData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for bucket in file_data.buckets {
            data.insert(bucket.id, bucket);
        }

        Ok(())
    }

    pub fn get(&self, id: BucketId) -> Result<Option<Bucket>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All buckets, in display order
    pub fn get_all(&self) -> Result<Vec<Bucket>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut buckets: Vec<_> = data.values().cloned().collect();
        buckets.sort_by(by_display_order);
        Ok(buckets)
    }

    /// Active buckets in allocation order
    pub fn get_active(&self) -> Result<Vec<Bucket>, FlowSplitError> {
        Ok(self.get_all()?.into_iter().filter(|b| b.active).collect())
    }

    /// Get a bucket by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Bucket>, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let name = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|b| b.name.to_lowercase() == name)
            .cloned())
    }

    /// Insert or update a bucket
    pub fn upsert(&self, bucket: Bucket) -> Result<(), FlowSplitError> {
        let mut data = self.data.write().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(bucket.id, bucket);
        Ok(())
    }

    /// Upsert a bucket and write only its record to disk
    pub fn persist(&self, bucket: &Bucket) -> Result<(), FlowSplitError> {
        let mut on_disk: BucketData = read_json(&self.path)?;
        match on_disk.buckets.iter_mut().find(|b| b.id == bucket.id) {
            Some(existing) => *existing = bucket.clone(),
            None => on_disk.buckets.push(bucket.clone()),
        }
        write_json_atomic(&self.path, &on_disk)?;

        self.upsert(bucket.clone())
    }

    /// One past the highest sort order in use
    pub fn next_sort_order(&self) -> Result<i32, FlowSplitError> {
        let data = self.data.read().map_err(|e| {
            FlowSplitError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().map(|b| b.sort_order).max().map_or(0, |max| max + 1))
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
    use crate::models::{Money, Percentage};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BucketRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BucketRepository::new(temp_dir.path().join("buckets.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_display_order() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Bucket::percentage("savings", Percentage::from_points(15)).with_sort_order(1))
            .unwrap();
        repo.upsert(Bucket::percentage("Tithe", Percentage::from_points(10)).with_sort_order(0))
            .unwrap();
        repo.upsert(Bucket::fixed("Rent", Money::from_dollars(900)).with_sort_order(1))
            .unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Tithe", "Rent", "savings"]);
    }

    #[test]
    fn test_active_and_by_name() {
        let (_temp_dir, repo) = create_test_repo();
        let mut old = Bucket::percentage("Old", Percentage::from_points(5));
        old.deactivate();
        repo.upsert(old).unwrap();
        repo.upsert(Bucket::percentage("Tithe", Percentage::from_points(10)))
            .unwrap();

        assert_eq!(repo.get_active().unwrap().len(), 1);
        assert!(repo.get_by_name("tithe").unwrap().is_some());
        assert!(repo.get_by_name("Other").unwrap().is_none());
    }

    #[test]
    fn test_next_sort_order_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        assert_eq!(repo.next_sort_order().unwrap(), 0);

        repo.persist(&Bucket::fixed("Rent", Money::from_dollars(900)).with_sort_order(4))
            .unwrap();
        assert_eq!(repo.next_sort_order().unwrap(), 5);

        let repo2 = BucketRepository::new(temp_dir.path().join("buckets.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.count().unwrap(), 1);
    }

    #[test]
    fn test_persist_merges_with_file() {
        let (temp_dir, repo) = create_test_repo();
        let other = BucketRepository::new(temp_dir.path().join("buckets.json"));

        repo.persist(&Bucket::fixed("Rent", Money::from_dollars(900)))
            .unwrap();
        other
            .persist(&Bucket::percentage("Tithe", Percentage::from_points(10)))
            .unwrap();

        let reader = BucketRepository::new(temp_dir.path().join("buckets.json"));
        reader.load().unwrap();
        assert_eq!(reader.count().unwrap(), 2);
    }
}
