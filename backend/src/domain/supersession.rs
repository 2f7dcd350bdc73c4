//! Soft-delete-and-recreate versioning.
//!
//! Commodities and proposals are never edited in place. An edit writes a new
//! row carrying the same stable code and stamps the old row as superseded; a
//! deletion only stamps. Reads choose whether superseded rows are visible
//! through [`Visibility`], the single predicate every store applies.

use chrono::{DateTime, Utc};

/// Which versions of a superseded entity a read may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Only rows that have not been superseded or retired.
    #[default]
    Live,
    /// Every version, for audit reads.
    IncludingSuperseded,
}

impl Visibility {
    /// Whether a row stamped with `superseded_at` is visible.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use crop_connect::domain::Visibility;
    ///
    /// assert!(Visibility::Live.admits(None));
    /// assert!(!Visibility::Live.admits(Some(Utc::now())));
    /// assert!(Visibility::IncludingSuperseded.admits(Some(Utc::now())));
    /// ```
    pub fn admits(self, superseded_at: Option<DateTime<Utc>>) -> bool {
        match self {
            Self::Live => superseded_at.is_none(),
            Self::IncludingSuperseded => true,
        }
    }
}
