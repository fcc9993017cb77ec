//! In-process [`ObjectStore`] used by tests and local runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use docgen_core::storage_keys::StorageLocation;

use crate::adapters::object_store::{ObjectStore, StorageError, StorageErrorKind};

#[derive(Debug, Default)]
struct MemoryState {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    denied_reads: BTreeSet<String>,
    denied_writes: BTreeSet<String>,
    faulty_buckets: BTreeSet<String>,
}

/// Buckets must be created before use; reads from an unknown bucket behave
/// like S3's `NoSuchBucket`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    state: Mutex<MemoryState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buckets<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let store = Self::new();
        for name in names {
            store.create_bucket(name);
        }
        store
    }

    pub fn create_bucket(&self, name: &str) {
        self.lock().buckets.entry(name.to_string()).or_default();
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.to_vec());
    }

    /// Reads from the bucket fail as access denied.
    pub fn deny_reads(&self, bucket: &str) {
        self.lock().denied_reads.insert(bucket.to_string());
    }

    /// Writes to the bucket fail as access denied.
    pub fn deny_writes(&self, bucket: &str) {
        self.lock().denied_writes.insert(bucket.to_string());
    }

    /// Every call against the bucket fails with an unclassified fault.
    pub fn fail_all(&self, bucket: &str) {
        self.lock().faulty_buckets.insert(bucket.to_string());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn readable_bucket<'a>(
        state: &'a MemoryState,
        bucket: &str,
    ) -> Result<&'a BTreeMap<String, Vec<u8>>, StorageError> {
        if state.faulty_buckets.contains(bucket) {
            return Err(StorageError::other(format!(
                "simulated storage fault for bucket: {bucket}"
            )));
        }
        if state.denied_reads.contains(bucket) {
            return Err(StorageError::new(
                StorageErrorKind::BucketUnavailable,
                format!("AccessDenied: {bucket}"),
            ));
        }
        state.buckets.get(bucket).ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::BucketUnavailable,
                format!("NoSuchBucket: {bucket}"),
            )
        })
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError> {
        let state = self.lock();
        Self::readable_bucket(&state, &location.bucket)?
            .get(&location.key)
            .cloned()
            .ok_or_else(|| {
                StorageError::new(
                    StorageErrorKind::NotFound,
                    format!("NoSuchKey: {location}"),
                )
            })
    }

    fn put_object(&self, location: &StorageLocation, body: &[u8]) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.faulty_buckets.contains(&location.bucket) {
            return Err(StorageError::other(format!(
                "simulated storage fault for bucket: {}",
                location.bucket
            )));
        }
        if state.denied_writes.contains(&location.bucket) {
            return Err(StorageError::new(
                StorageErrorKind::BucketUnavailable,
                format!("AccessDenied: {}", location.bucket),
            ));
        }
        let objects = state.buckets.get_mut(&location.bucket).ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::BucketUnavailable,
                format!("NoSuchBucket: {}", location.bucket),
            )
        })?;
        objects.insert(location.key.clone(), body.to_vec());
        Ok(())
    }

    fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let state = self.lock();
        Ok(Self::readable_bucket(&state, bucket)?.keys().cloned().collect())
    }

    fn object_exists(&self, location: &StorageLocation) -> Result<bool, StorageError> {
        let state = self.lock();
        Ok(Self::readable_bucket(&state, &location.bucket)?.contains_key(&location.key))
    }
}
