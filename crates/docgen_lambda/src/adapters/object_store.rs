use docgen_core::storage_keys::StorageLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The bucket exists but the key does not.
    NotFound,
    /// The bucket does not exist or the caller may not access it.
    BucketUnavailable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Other, message)
    }
}

/// Blob store capability the handlers depend on. Implementations are injected
/// through the handler entry points.
pub trait ObjectStore {
    fn get_object(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError>;

    fn put_object(&self, location: &StorageLocation, body: &[u8]) -> Result<(), StorageError>;

    /// All keys in the bucket, in the store's listing order.
    fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// `Ok(false)` only when the bucket is reachable and the key is absent.
    fn object_exists(&self, location: &StorageLocation) -> Result<bool, StorageError>;
}
