//! Per-call time bound for any media store.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;
use url::Url;

use crate::domain::ports::{MediaStore, MediaStoreError};
use crate::domain::{ImageUpload, MediaFolder};

/// Decorator failing any call to the inner store that outlasts `limit`.
#[derive(Debug)]
pub struct BoundedMediaStore<M> {
    inner: M,
    limit: Duration,
}

impl<M> BoundedMediaStore<M> {
    /// Bound every call to `inner` by `limit`.
    pub const fn new(inner: M, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// The wrapped store.
    pub const fn inner(&self) -> &M {
        &self.inner
    }

    fn expired(&self, operation: &str, folder: MediaFolder) -> MediaStoreError {
        let seconds = self.limit.as_secs();
        warn!(operation, folder = folder.as_str(), seconds, "media call timed out");
        MediaStoreError::timeout(operation, seconds)
    }
}

#[async_trait]
impl<M> MediaStore for BoundedMediaStore<M>
where
    M: MediaStore,
{
    async fn upload(
        &self,
        folder: MediaFolder,
        files: &[ImageUpload],
    ) -> Result<Vec<Url>, MediaStoreError> {
        timeout(self.limit, self.inner.upload(folder, files))
            .await
            .map_err(|_| self.expired("upload", folder))?
    }

    async fn delete(&self, folder: MediaFolder, urls: &[Url]) -> Result<(), MediaStoreError> {
        timeout(self.limit, self.inner.delete(folder, urls))
            .await
            .map_err(|_| self.expired("delete", folder))?
    }
}
