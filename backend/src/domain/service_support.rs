//! Error translation shared by the lifecycle services.

use crate::domain::Error;
use crate::domain::ports::{MediaStoreError, RepositoryError};

/// Translate a repository failure into a domain error.
///
/// Storage-level uniqueness violations surface as `Conflict`; everything
/// else is an opaque dependency failure.
pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::dependency(format!("repository unavailable: {message}"))
        }
        RepositoryError::Query { message } => {
            Error::dependency(format!("repository error: {message}"))
        }
        RepositoryError::Conflict { message } => Error::conflict(message),
    }
}

/// Like [`map_repository_error`], but a uniqueness violation means a
/// concurrent request already moved the entity on, so it reads as
/// `InvalidState`.
pub(crate) fn map_repository_error_as_state(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Conflict { message } => Error::invalid_state(message),
        other => map_repository_error(other),
    }
}

/// Translate a media store failure into a domain error.
pub(crate) fn map_media_error(error: MediaStoreError) -> Error {
    Error::dependency(error.to_string())
}
