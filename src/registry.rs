//! Subscriber registry backed by blob storage
//!
//! The whole subscriber list lives in one JSON array under a single
//! bucket/key pair. Every operation is a fresh read-modify-write with no
//! optimistic concurrency: last writer wins, and two simultaneous join
//! events can lose one addition. Invocation concurrency is expected to be
//! low, so this is a documented accepted limitation.

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error retrieving the object from S3
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    /// Error putting the object into S3
    #[error("S3 put error: {0}")]
    S3Put(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface for blob storage providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the object at `key`; `None` when it does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    /// Write `bytes` to the object at `key`
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// S3-backed blob store bound to one bucket
pub struct S3Blob {
    client: Client,
    bucket: String,
}

impl S3Blob {
    /// Create a blob store from the ambient AWS configuration
    pub async fn new(bucket: String) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&sdk_config),
            bucket,
        }
    }
}

#[async_trait]
impl BlobStore for S3Blob {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
                    .into_bytes();
                Ok(Some(data.to_vec()))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StorageError::S3Get(Box::new(e))),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        Ok(())
    }
}

/// Read-modify-write registry of subscriber ids
pub struct SubscriberRegistry {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl SubscriberRegistry {
    /// Create a registry over the given store and object key
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, key: String) -> Self {
        Self { store, key }
    }

    /// Load the current subscriber list; a missing object is an empty list
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the read or JSON parsing fails.
    pub async fn load(&self) -> Result<Vec<String>, StorageError> {
        match self.store.get(&self.key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Register a subscriber. A duplicate id is a logged no-op, so the
    /// persisted list never contains the same id twice.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the read or write fails.
    pub async fn add(&self, id: &str) -> Result<(), StorageError> {
        info!("Join from: {}", id);
        let mut ids = self.load().await?;

        if ids.iter().any(|existing| existing == id) {
            info!("Subscriber already registered, skipping write");
            return Ok(());
        }

        ids.push(id.to_string());
        self.save(&ids).await
    }

    /// Remove a subscriber. An unknown id is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the read or write fails.
    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        info!("Leave from: {}", id);
        let ids = self.load().await?;

        if !ids.iter().any(|existing| existing == id) {
            info!("Subscriber not registered, nothing to remove");
            return Ok(());
        }

        let remaining: Vec<String> = ids.into_iter().filter(|existing| existing != id).collect();
        self.save(&remaining).await
    }

    async fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(ids)?;
        self.store.put(&self.key, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn stored(ids: &[&str]) -> Option<Vec<u8>> {
        // Fixture list in the same shape the registry writes
        serde_json::to_vec(ids).ok()
    }

    #[tokio::test]
    async fn test_load_missing_object_is_empty() -> Result<(), StorageError> {
        let mut store = MockBlobStore::new();
        store.expect_get().returning(|_| Ok(None));

        let registry = SubscriberRegistry::new(Arc::new(store), "ids.json".into());
        assert!(registry.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_appends_and_writes_back() -> Result<(), StorageError> {
        let mut store = MockBlobStore::new();
        store
            .expect_get()
            .with(eq("ids.json"))
            .returning(|_| Ok(stored(&["abcde"])));
        store
            .expect_put()
            .withf(|key, bytes| {
                key == "ids.json"
                    && serde_json::from_slice::<Vec<String>>(bytes)
                        .is_ok_and(|ids| ids == ["abcde", "fghij"])
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let registry = SubscriberRegistry::new(Arc::new(store), "ids.json".into());
        registry.add("fghij").await
    }

    #[tokio::test]
    async fn test_add_duplicate_does_not_write() -> Result<(), StorageError> {
        let mut store = MockBlobStore::new();
        store
            .expect_get()
            .returning(|_| Ok(stored(&["abcde"])));
        store.expect_put().times(0);

        let registry = SubscriberRegistry::new(Arc::new(store), "ids.json".into());
        registry.add("abcde").await
    }

    #[tokio::test]
    async fn test_remove_writes_back_filtered_list() -> Result<(), StorageError> {
        let mut store = MockBlobStore::new();
        store
            .expect_get()
            .returning(|_| Ok(stored(&["abcde", "fghij"])));
        store
            .expect_put()
            .withf(|_, bytes| {
                serde_json::from_slice::<Vec<String>>(bytes).is_ok_and(|ids| ids == ["fghij"])
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let registry = SubscriberRegistry::new(Arc::new(store), "ids.json".into());
        registry.remove("abcde").await
    }

    #[tokio::test]
    async fn test_remove_unknown_id_does_not_write() -> Result<(), StorageError> {
        let mut store = MockBlobStore::new();
        store
            .expect_get()
            .returning(|_| Ok(stored(&["abcde"])));
        store.expect_put().times(0);

        let registry = SubscriberRegistry::new(Arc::new(store), "ids.json".into());
        registry.remove("zzzzz").await
    }
}
