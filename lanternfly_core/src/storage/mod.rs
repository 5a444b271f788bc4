//! Object store access for uploaded images.
//!
//! Handlers only see the [`ImageStore`] trait; the production implementation
//! is [`ContainerClient`], a thin wrapper over an `object_store` backend bound
//! to a single Azure Blob Storage container.

pub mod azure;
pub mod container;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use azure::{connect, ConnectionString};
pub use container::ContainerClient;

/// Backend failures display as the backend's own message; the key or container
/// is kept for logging through `Debug`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{source}")]
    Upload {
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("{source}")]
    List {
        container: String,
        #[source]
        source: object_store::Error,
    },

    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Backend(#[from] object_store::Error),
}

/// A blob as seen through a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Base URL that object keys are appended to.
    fn container_url(&self) -> &str;

    /// Writes `data` under `key`, replacing any existing blob, and returns its
    /// public URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, StoreError>;

    async fn list(&self) -> Result<Vec<StoredObject>, StoreError>;

    fn blob_url(&self, key: &str) -> String {
        format!("{}/{}", self.container_url(), key)
    }
}
