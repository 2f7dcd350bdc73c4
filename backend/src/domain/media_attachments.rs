//! Media attachment manager.
//!
//! Wraps a [`MediaStore`] with the bookkeeping the lifecycle services need:
//! upload validation, positional rewrites of an existing URL list, and
//! compensation when the repository write that follows an upload fails.
//!
//! Compensation contract: objects uploaded for a write that then fails are
//! deleted before the write's error is returned. If that deletion also fails
//! the deletion error is returned instead, since it signals store trouble
//! that would otherwise go unnoticed. Objects retired by a rewrite are only
//! deleted once the write has committed.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, warn};
use url::Url;

use crate::domain::ports::MediaStore;
use crate::domain::service_support::map_media_error;
use crate::domain::{Error, ImageChange, ImageUpload, MediaFolder, validate_uploads};

/// Outcome of rewriting an attachment list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplacedMedia {
    /// The new list, in position order.
    pub urls: Vec<Url>,
    /// URLs created by this rewrite; deleted if the commit fails.
    pub uploaded: Vec<Url>,
    /// URLs dropped or replaced by this rewrite; deleted after the commit.
    pub retired: Vec<Url>,
}

/// Media operations with compensation, shared by every flow storing images.
pub struct MediaAttachments<M> {
    store: Arc<M>,
}

impl<M> Clone for MediaAttachments<M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<M> MediaAttachments<M> {
    /// Wrap a media store.
    pub fn new(store: Arc<M>) -> Self {
        Self { store }
    }
}

impl<M> MediaAttachments<M>
where
    M: MediaStore,
{
    /// Validate and store `files`, returning their URLs in input order.
    pub async fn upload(
        &self,
        folder: MediaFolder,
        files: &[ImageUpload],
    ) -> Result<Vec<Url>, Error> {
        validate_uploads(files)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .upload(folder, files)
            .await
            .map_err(map_media_error)
    }

    /// Remove stored objects.
    pub async fn delete(&self, folder: MediaFolder, urls: &[Url]) -> Result<(), Error> {
        if urls.is_empty() {
            return Ok(());
        }
        self.store.delete(folder, urls).await.map_err(map_media_error)
    }

    /// Rewrite `existing` position by position.
    ///
    /// `changes` must have one entry per existing URL. Replacement files are
    /// uploaded in a single call; nothing is deleted here.
    ///
    /// An all-[`ImageChange::Keep`] changeset returns `existing` unchanged
    /// without touching the store.
    pub async fn replace(
        &self,
        folder: MediaFolder,
        existing: &[Url],
        changes: Vec<ImageChange>,
    ) -> Result<ReplacedMedia, Error> {
        if changes.len() != existing.len() {
            return Err(Error::invalid_input(format!(
                "got {} image changes for {} stored images",
                changes.len(),
                existing.len()
            )));
        }
        let files: Vec<ImageUpload> = changes
            .iter()
            .filter_map(|change| match change {
                ImageChange::Replace(file) => Some(file.clone()),
                ImageChange::Keep | ImageChange::Delete => None,
            })
            .collect();
        let uploaded = self.upload(folder, &files).await?;

        let mut fresh = uploaded.iter().cloned();
        let mut result = ReplacedMedia {
            uploaded: uploaded.clone(),
            ..ReplacedMedia::default()
        };
        for (url, change) in existing.iter().zip(changes) {
            match change {
                ImageChange::Keep => result.urls.push(url.clone()),
                ImageChange::Replace(_) => {
                    let Some(next) = fresh.next() else {
                        return Err(self
                            .compensate(
                                folder,
                                &uploaded,
                                Error::dependency("media store returned too few URLs"),
                            )
                            .await);
                    };
                    result.urls.push(next);
                    result.retired.push(url.clone());
                }
                ImageChange::Delete => result.retired.push(url.clone()),
            }
        }
        Ok(result)
    }

    /// Upload `files`, then run `commit` with their URLs.
    ///
    /// When `commit` fails the uploads are deleted before its error is
    /// returned.
    pub async fn with_media_rollback<T, F, Fut>(
        &self,
        folder: MediaFolder,
        files: &[ImageUpload],
        commit: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(Vec<Url>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let urls = self.upload(folder, files).await?;
        match commit(urls.clone()).await {
            Ok(value) => Ok(value),
            Err(commit_error) => Err(self.compensate(folder, &urls, commit_error).await),
        }
    }

    /// Rewrite `existing`, then run `commit` with the new list.
    ///
    /// A failed commit deletes the fresh uploads. A successful one deletes
    /// the retired URLs; failure there is logged and the committed value is
    /// still returned.
    pub async fn replace_with_rollback<T, F, Fut>(
        &self,
        folder: MediaFolder,
        existing: &[Url],
        changes: Vec<ImageChange>,
        commit: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(Vec<Url>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let replaced = self.replace(folder, existing, changes).await?;
        let value = match commit(replaced.urls).await {
            Ok(value) => value,
            Err(commit_error) => {
                return Err(self.compensate(folder, &replaced.uploaded, commit_error).await);
            }
        };
        if let Err(cleanup) = self.delete(folder, &replaced.retired).await {
            warn!(
                folder = folder.as_str(),
                retired = replaced.retired.len(),
                error = %cleanup,
                "failed to delete retired media after commit"
            );
        }
        Ok(value)
    }

    async fn compensate(&self, folder: MediaFolder, uploaded: &[Url], cause: Error) -> Error {
        if uploaded.is_empty() {
            return cause;
        }
        warn!(
            folder = folder.as_str(),
            uploaded = uploaded.len(),
            error = %cause,
            "write failed after upload; deleting uploaded media"
        );
        match self.delete(folder, uploaded).await {
            Ok(()) => cause,
            Err(cleanup) => {
                error!(
                    folder = folder.as_str(),
                    uploaded = uploaded.len(),
                    error = %cleanup,
                    original = %cause,
                    "media compensation failed; objects may be orphaned"
                );
                cleanup
            }
        }
    }
}

#[cfg(test)]
#[path = "media_attachments_tests.rs"]
mod tests;
