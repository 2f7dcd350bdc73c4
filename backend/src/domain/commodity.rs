//! Commodities a farmer can plant and sell.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{CommodityCode, CommodityId, Error, UserId};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 100;

/// One version of a farmer's commodity.
///
/// ## Invariants
/// - `name` is unique per owner among live versions.
/// - `code` is shared by every version produced by edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
    pub id: CommodityId,
    pub code: CommodityCode,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub seed: String,
    pub planting_period_days: u32,
    pub price_per_kg: u64,
    pub is_perennial: bool,
    pub is_available: bool,
    pub image_urls: Vec<Url>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub superseded_at: Option<DateTime<Utc>>,
}

/// Farmer-editable commodity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityDraft {
    pub name: String,
    pub description: String,
    pub seed: String,
    pub planting_period_days: u32,
    pub price_per_kg: u64,
    pub is_perennial: bool,
    pub is_available: bool,
}

impl CommodityDraft {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), Error> {
        check_length("name", &self.name)?;
        check_length("seed", &self.seed)?;
        if self.planting_period_days == 0 {
            return Err(Error::invalid_input("planting period must be at least one day"));
        }
        if self.price_per_kg == 0 {
            return Err(Error::invalid_input("price per kg must be positive"));
        }
        Ok(())
    }
}

fn check_length(field: &str, value: &str) -> Result<(), Error> {
    let length = value.trim().chars().count();
    if (NAME_MIN..=NAME_MAX).contains(&length) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{field} must be between {NAME_MIN} and {NAME_MAX} characters"
        )))
    }
}

impl Commodity {
    /// Materialise a brand-new commodity with a fresh code.
    pub fn create(
        owner_id: UserId,
        draft: CommodityDraft,
        image_urls: Vec<Url>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommodityId::random(),
            code: CommodityCode::random(),
            owner_id,
            name: draft.name.trim().to_owned(),
            description: draft.description,
            seed: draft.seed,
            planting_period_days: draft.planting_period_days,
            price_per_kg: draft.price_per_kg,
            is_perennial: draft.is_perennial,
            is_available: draft.is_available,
            image_urls,
            created_at: now,
            updated_at: None,
            superseded_at: None,
        }
    }

    /// Build the version that replaces `self` after an edit.
    ///
    /// The code, original creation time and perennial flag carry over.
    pub fn superseding(
        &self,
        draft: CommodityDraft,
        image_urls: Vec<Url>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommodityId::random(),
            code: self.code,
            owner_id: self.owner_id,
            name: draft.name.trim().to_owned(),
            description: draft.description,
            seed: draft.seed,
            planting_period_days: draft.planting_period_days,
            price_per_kg: draft.price_per_kg,
            is_perennial: self.is_perennial,
            is_available: draft.is_available,
            image_urls,
            created_at: self.created_at,
            updated_at: Some(now),
            superseded_at: None,
        }
    }

    /// Expected harvest time for a batch planted at `planted_at`.
    pub fn estimated_harvest_date(&self, planted_at: DateTime<Utc>) -> DateTime<Utc> {
        planted_at + Duration::days(i64::from(self.planting_period_days))
    }
}
