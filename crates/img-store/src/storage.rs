//! Bytes collection: object storage for encoded image payloads
//! (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

const IMAGES_PREFIX: &str = "images";

/// Raw key bytes per path segment. Percent-encoding can triple them, which
/// must still fit a file name on local filesystems.
const KEY_SEGMENT_BYTES: usize = 64;

/// Marks segments that continue into a directory.
const DIR_SEGMENT_TAG: char = 'd';
/// Marks the segment that ends the key.
const LAST_SEGMENT_TAG: char = 'f';

/// Configuration for the bytes collection backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BytesStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Access to the Bytes collection.
///
/// Records are immutable: `insert` must fail with
/// [`StoreError::AlreadyExists`] when the key is already present, and must
/// never overwrite it.
#[async_trait::async_trait]
pub(crate) trait BytesStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    async fn insert(&self, key: &str, payload: Bytes) -> Result<()>;
}

/// Bytes collection backed by an `object_store` implementation.
#[derive(Debug, Clone)]
pub(crate) struct ObjectBytes {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectBytes {
    /// Create a new storage backend from configuration.
    pub async fn new(config: &BytesStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config {
            BytesStoreConfig::Memory => Arc::new(InMemory::new()),

            BytesStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                )
            }

            BytesStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"))
                    // create-only puts back the uniqueness of bytes keys
                    .with_conditional_put(S3ConditionalPut::ETagMatch);

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                );

                // Verify bucket exists by listing (empty prefix)
                // This will fail fast if the bucket doesn't exist
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(StoreError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket")
                                || msg.contains("bucket") && msg.contains("not")
                            {
                                return Err(StoreError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                store
            }
        };

        Ok(Self { inner })
    }

    /// Object path for a bytes key.
    ///
    /// The key is cut into segments of at most [`KEY_SEGMENT_BYTES`] on char
    /// boundaries. Every segment is percent-encoded as a whole, so `/`, empty
    /// runs and dot segments in groups are never interpreted as directories.
    /// Inner segments are tagged [`DIR_SEGMENT_TAG`] and the final one
    /// [`LAST_SEGMENT_TAG`], so a key's file can never sit where a longer
    /// key needs a directory.
    fn data_path(key: &str) -> ObjectPath {
        let segments = key_segments(key);
        let last = segments.len() - 1;
        let parts = segments.into_iter().enumerate().map(|(i, segment)| {
            let tag = if i == last {
                LAST_SEGMENT_TAG
            } else {
                DIR_SEGMENT_TAG
            };
            format!("{tag}{segment}")
        });
        ObjectPath::from_iter(std::iter::once(IMAGES_PREFIX.to_string()).chain(parts))
    }
}

/// Split `key` into consecutive non-overlapping pieces of bounded size.
/// Always yields at least one piece.
fn key_segments(key: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = key;
    while rest.len() > KEY_SEGMENT_BYTES {
        let mut end = KEY_SEGMENT_BYTES;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        segments.push(head);
        rest = tail;
    }
    segments.push(rest);
    segments
}

#[async_trait::async_trait]
impl BytesStore for ObjectBytes {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = Self::data_path(key);
        match self.inner.get(&path).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert(&self, key: &str, payload: Bytes) -> Result<()> {
        let path = Self::data_path(key);
        match self
            .inner
            .put_opts(&path, payload.into(), PutMode::Create.into())
            .await
        {
            Ok(_) => Ok(()),
            Err(object_store::Error::AlreadyExists { .. }) => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
