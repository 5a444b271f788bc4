use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use super::naming::{self, Clock, SystemClock};
use super::validation;
use crate::error::Result;
use crate::storage::ImageStore;

/// A file part pulled out of an upload request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
}

impl ImageService {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the upload, stores it under a timestamped key and returns the
    /// blob's public URL. Nothing reaches the store when validation fails.
    pub async fn upload(&self, upload: ImageUpload) -> Result<String> {
        let content_type =
            validation::validate_upload(&upload.filename, upload.content_type.as_deref())?;

        let key = naming::storage_key(&upload.filename, self.clock.now());
        let url = self.store.put(&key, upload.data, &content_type).await?;

        info!("Uploaded {}", url);
        Ok(url)
    }

    /// Every stored blob's URL, newest first.
    pub async fn gallery(&self) -> Result<Vec<String>> {
        let objects = self.store.list().await?;

        let mut urls: Vec<String> = objects
            .iter()
            .map(|object| self.store.blob_url(&object.key))
            .collect();

        // Relies on the timestamp prefix; keys without it are not special-cased.
        urls.sort_unstable_by(|a, b| b.cmp(a));

        Ok(urls)
    }
}
