//! Validator review of farmer-submitted evidence.
//!
//! Treatment records and harvests share the same review contract: only a
//! pending submission can be reviewed, the verdict is either approval or a
//! request for revision, and a revision must say what to fix.

use serde::{Deserialize, Serialize};

use crate::domain::Error;

/// Outcome chosen by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approved,
    Revision,
}

/// A validator's review of a pending submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub verdict: ReviewVerdict,
    pub revision_note: Option<String>,
    pub warning_note: Option<String>,
}

impl ReviewRequest {
    /// Approve the submission.
    pub fn approve() -> Self {
        Self {
            verdict: ReviewVerdict::Approved,
            revision_note: None,
            warning_note: None,
        }
    }

    /// Send the submission back with `note` describing what to fix.
    pub fn revise(note: impl Into<String>) -> Self {
        Self {
            verdict: ReviewVerdict::Revision,
            revision_note: Some(note.into()),
            warning_note: None,
        }
    }

    /// Attach a warning for the farmer regardless of verdict.
    pub fn with_warning(mut self, note: impl Into<String>) -> Self {
        self.warning_note = Some(note.into());
        self
    }

    /// The revision note to persist, enforcing that revisions carry one.
    ///
    /// Approval always yields `None` so a stale revision note is cleared.
    pub fn checked_revision_note(&self) -> Result<Option<String>, Error> {
        match self.verdict {
            ReviewVerdict::Approved => Ok(None),
            ReviewVerdict::Revision => non_blank(self.revision_note.clone())
                .map(Some)
                .ok_or_else(|| Error::invalid_input("revision note must not be empty")),
        }
    }

    /// The warning note to persist.
    pub fn warning(&self) -> Option<String> {
        non_blank(self.warning_note.clone())
    }
}

/// Collapse blank notes to `None`.
pub fn non_blank(note: Option<String>) -> Option<String> {
    note.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn revision_requires_a_note(#[case] note: &str) {
        let err = ReviewRequest::revise(note)
            .checked_revision_note()
            .expect_err("blank revision note");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[rstest]
    fn approval_clears_revision_note() {
        let mut request = ReviewRequest::approve();
        request.revision_note = Some("left over".to_owned());
        assert_eq!(request.checked_revision_note().expect("approval"), None);
    }

    #[rstest]
    fn blank_warning_is_dropped() {
        let request = ReviewRequest::approve().with_warning("  ");
        assert_eq!(request.warning(), None);
    }
}
