//! Port for the external object store holding uploaded images.

use async_trait::async_trait;
use url::Url;

use crate::domain::{ImageUpload, MediaFolder};

use super::define_port_error;

define_port_error! {
    /// Errors raised by media store adapters.
    pub enum MediaStoreError {
        /// The store refused or failed an upload.
        Upload { message: String } => "media upload failed: {message}",
        /// The store refused or failed a deletion.
        Delete { message: String } => "media deletion failed: {message}",
        /// The call did not complete within the configured bound.
        Timeout { operation: String, seconds: u64 } =>
            "media {operation} timed out after {seconds}s",
    }
}

/// Port for storing and removing image objects.
///
/// Uploads return one URL per file, in input order. An upload that fails
/// part-way must not leave stored objects behind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `files` under `folder` and return their public URLs.
    async fn upload(
        &self,
        folder: MediaFolder,
        files: &[ImageUpload],
    ) -> Result<Vec<Url>, MediaStoreError>;

    /// Remove the objects behind `urls`. Unknown URLs are ignored.
    async fn delete(&self, folder: MediaFolder, urls: &[Url]) -> Result<(), MediaStoreError>;
}
