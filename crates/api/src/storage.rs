//! Object storage seam for product images.
//!
//! The catalog service uploads image bytes at product creation and
//! deletes the stored objects when a product (or one of its images) is
//! removed. Production binds this to the object storage provider;
//! [`MemoryObjectStorage`] keeps objects in a map for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use atelier_core::ImageId;

/// A stored object reference returned by an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub id: ImageId,
    /// Publicly addressable URL for the uploaded object.
    pub url: String,
}

/// Errors from the object storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The upload payload was rejected (empty body, bad content type).
    #[error("rejected upload: {0}")]
    Rejected(String),

    /// The provider failed or was unreachable.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage operations the catalog service depends on.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload one image, returning its id and public URL.
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<StoredImage, StorageError>;

    /// Delete a stored image. Deleting an unknown id is not an error;
    /// the catalog record is already the source of truth.
    async fn delete(&self, id: &ImageId) -> Result<(), StorageError>;
}

/// Map-backed storage used by tests.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<ImageId, String>>,
}

impl MemoryObjectStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    /// Whether no objects are stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<StoredImage, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Rejected("empty upload body".to_owned()));
        }
        let id = ImageId::new(Uuid::new_v4().simple().to_string());
        let url = format!("memory://images/{}/{filename}", id.as_str());
        self.objects.lock().await.insert(id.clone(), url.clone());
        Ok(StoredImage { id, url })
    }

    async fn delete(&self, id: &ImageId) -> Result<(), StorageError> {
        self.objects.lock().await.remove(id);
        Ok(())
    }
}
