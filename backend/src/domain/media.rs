//! Media attachment values shared by commodity, treatment and harvest flows.
//!
//! Uploads arrive as raw bytes plus their declared content type; once stored
//! they are referred to only by the URL the media store returned. Evidence
//! records keep those URLs paired with the farmer's note in submission order.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::Error;

/// Largest accepted image payload (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/jpg", "image/jpeg", "image/png"];

/// Logical folder an object is filed under in the media store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFolder {
    Commodities,
    TreatmentRecords,
    Harvests,
}

impl MediaFolder {
    /// Path segment used by stores that lay objects out by folder.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commodities => "commodities",
            Self::TreatmentRecords => "treatment_records",
            Self::Harvests => "harvests",
        }
    }
}

/// An image received from a caller and not yet stored.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Build an upload from its parts.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reject oversized payloads and unsupported image types.
    pub fn validate(&self) -> Result<(), Error> {
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::invalid_input(format!(
                "image {} exceeds the 10MB limit",
                self.file_name
            )));
        }
        if !ACCEPTED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(Error::invalid_input(format!(
                "image type {} is not supported",
                self.content_type
            )));
        }
        Ok(())
    }

    /// File extension matching the declared content type.
    pub fn extension(&self) -> &'static str {
        if self.content_type == "image/png" {
            "png"
        } else {
            "jpg"
        }
    }
}

/// Per-position instruction for rewriting an existing attachment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    /// Pass the stored URL through unchanged.
    Keep,
    /// Upload this file and use its URL in place of the stored one.
    Replace(ImageUpload),
    /// Drop the position entirely.
    Delete,
}

impl ImageChange {
    /// Whether this position survives the rewrite.
    pub fn is_retained(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}

/// One evidence entry: a stored image and the note describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAndNote {
    pub image_url: Url,
    pub note: String,
}

/// Reject a submission whose images and notes cannot be paired one-to-one.
///
/// At least one pair is required.
pub fn ensure_paired(images: usize, notes: usize) -> Result<(), Error> {
    if images != notes {
        return Err(Error::invalid_input(format!(
            "got {images} images but {notes} notes"
        )));
    }
    if images == 0 {
        return Err(Error::invalid_input("images and notes must not be empty"));
    }
    Ok(())
}

/// Validate every upload in a batch.
pub fn validate_uploads<'a>(
    uploads: impl IntoIterator<Item = &'a ImageUpload>,
) -> Result<(), Error> {
    uploads.into_iter().try_for_each(ImageUpload::validate)
}

/// Zip stored URLs with their notes, preserving order.
pub fn pair_with_notes(urls: Vec<Url>, notes: Vec<String>) -> Vec<ImageAndNote> {
    urls.into_iter()
        .zip(notes)
        .map(|(image_url, note)| ImageAndNote { image_url, note })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn upload(content_type: &str, len: usize) -> ImageUpload {
        ImageUpload::new("leaf", content_type, vec![0_u8; len])
    }

    #[rstest]
    #[case("image/png")]
    #[case("image/jpeg")]
    #[case("image/jpg")]
    fn accepts_supported_types(#[case] content_type: &str) {
        upload(content_type, 16).validate().expect("supported type");
    }

    #[rstest]
    #[case(upload("image/gif", 16))]
    #[case(upload("image/png", MAX_IMAGE_BYTES + 1))]
    fn rejects_unsupported_uploads(#[case] image: ImageUpload) {
        let err = image.validate().expect_err("upload must be rejected");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[rstest]
    #[case(2, 1)]
    #[case(0, 0)]
    fn pairing_requires_equal_non_empty_counts(#[case] images: usize, #[case] notes: usize) {
        let err = ensure_paired(images, notes).expect_err("pairing must fail");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[rstest]
    fn pair_with_notes_keeps_order() {
        let urls = vec![
            Url::parse("https://media.test/a.png").expect("url"),
            Url::parse("https://media.test/b.png").expect("url"),
        ];
        let pairs = pair_with_notes(urls, vec!["first".to_owned(), "second".to_owned()]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].note, "first");
        assert!(pairs[1].image_url.as_str().ends_with("b.png"));
    }
}
