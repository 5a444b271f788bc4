use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use object_store::{
    path::Path, Attribute, Attributes, ObjectMeta, ObjectStore, PutMode, PutOptions, PutPayload,
};
use tracing::debug;

use super::{ImageStore, StoreError, StoredObject};

/// Client bound to one container of an object store.
#[derive(Clone, Debug)]
pub struct ContainerClient {
    store: Arc<dyn ObjectStore>,
    container: String,
    url: String,
}

impl ContainerClient {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let url: String = url.into();

        Self {
            store,
            container: container.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

#[async_trait]
impl ImageStore for ContainerClient {
    fn container_url(&self) -> &str {
        &self.url
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, StoreError> {
        let location = Path::from(key);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let options = PutOptions {
            mode: PutMode::Overwrite,
            attributes,
            ..Default::default()
        };

        debug!("PUT {} ({} bytes, {})", location, data.len(), content_type);

        self.store
            .put_opts(&location, PutPayload::from(data), options)
            .await
            .map_err(|source| StoreError::Upload {
                key: key.to_string(),
                source,
            })?;

        Ok(self.blob_url(key))
    }

    async fn list(&self) -> Result<Vec<StoredObject>, StoreError> {
        debug!("LIST {}", self.container);

        let objects: Vec<ObjectMeta> = self
            .store
            .list(None)
            .try_collect()
            .await
            .map_err(|source| StoreError::List {
                container: self.container.clone(),
                source,
            })?;

        Ok(objects
            .into_iter()
            .map(|meta| {
                let key = meta.location.to_string();
                StoredObject {
                    url: self.blob_url(&key),
                    key,
                }
            })
            .collect())
    }
}
