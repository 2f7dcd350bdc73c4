//! Commodity catalogue service.
//!
//! Edits never overwrite a commodity in place: the edited version replaces
//! the old one under the same code and the old row is stamped superseded.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{CommodityRepository, MediaStore};
use crate::domain::service_support::map_repository_error;
use crate::domain::{
    Caller, Commodity, CommodityDraft, CommodityId, Error, ImageChange, ImageUpload,
    MediaAttachments, MediaFolder, Role, UserId, Visibility,
};

/// Commodity catalogue service.
pub struct CommodityService<C, M> {
    commodities: Arc<C>,
    media: MediaAttachments<M>,
    clock: Arc<dyn Clock>,
}

impl<C, M> CommodityService<C, M> {
    /// Create a service over the commodity store and media store.
    pub fn new(commodities: Arc<C>, media: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            commodities,
            media: MediaAttachments::new(media),
            clock,
        }
    }
}

impl<C, M> CommodityService<C, M>
where
    C: CommodityRepository,
    M: MediaStore,
{
    /// Register a new commodity for the calling farmer.
    pub async fn create(
        &self,
        caller: &Caller,
        draft: CommodityDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Commodity, Error> {
        let owner_id = caller.require_role(&[Role::Farmer])?;
        draft.validate()?;
        self.ensure_name_free(owner_id, &draft.name).await?;

        let now = self.clock.utc();
        let commodities = Arc::clone(&self.commodities);
        let commodity = self
            .media
            .with_media_rollback(MediaFolder::Commodities, &images, |urls| async move {
                let commodity = Commodity::create(owner_id, draft, urls, now);
                commodities
                    .create(&commodity)
                    .await
                    .map_err(map_repository_error)?;
                Ok(commodity)
            })
            .await?;

        debug!(commodity_id = %commodity.id, code = %commodity.code, "commodity created");
        Ok(commodity)
    }

    /// Replace a live commodity with an edited version.
    ///
    /// `changes` has one entry per stored image. The returned version has a
    /// new id and shares the code of the one it replaced.
    pub async fn edit(
        &self,
        caller: &Caller,
        id: CommodityId,
        draft: CommodityDraft,
        changes: Vec<ImageChange>,
    ) -> Result<Commodity, Error> {
        let owner_id = caller.require_role(&[Role::Farmer])?;
        draft.validate()?;
        let current = self.owned(id, owner_id).await?;
        if current.name != draft.name.trim() {
            self.ensure_name_free(owner_id, &draft.name).await?;
        }

        let now = self.clock.utc();
        let commodities = Arc::clone(&self.commodities);
        let existing = current.image_urls.clone();
        let replacement = self
            .media
            .replace_with_rollback(MediaFolder::Commodities, &existing, changes, |urls| async move {
                let replacement = current.superseding(draft, urls, now);
                let replaced = commodities
                    .supersede(current.id, &replacement, now)
                    .await
                    .map_err(map_repository_error)?;
                if !replaced {
                    return Err(Error::invalid_state("commodity was changed concurrently"));
                }
                Ok(replacement)
            })
            .await?;

        debug!(
            previous = %id,
            commodity_id = %replacement.id,
            code = %replacement.code,
            "commodity superseded"
        );
        Ok(replacement)
    }

    /// Soft-delete a live commodity owned by the caller.
    pub async fn retire(&self, caller: &Caller, id: CommodityId) -> Result<(), Error> {
        let owner_id = caller.require_role(&[Role::Farmer])?;
        self.owned(id, owner_id).await?;
        let retired = self
            .commodities
            .retire(id, self.clock.utc())
            .await
            .map_err(map_repository_error)?;
        if !retired {
            return Err(Error::not_found("commodity not found"));
        }
        debug!(commodity_id = %id, "commodity retired");
        Ok(())
    }

    /// A live commodity by id.
    pub async fn get(&self, id: CommodityId) -> Result<Commodity, Error> {
        self.commodities
            .find_by_id(id, Visibility::Live)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("commodity not found"))
    }

    /// Page through the calling farmer's live commodities.
    pub async fn list_for_owner(
        &self,
        caller: &Caller,
        page: PageRequest,
    ) -> Result<Page<Commodity>, Error> {
        let owner_id = caller.require_role(&[Role::Farmer])?;
        self.commodities
            .list_live_by_owner(owner_id, page)
            .await
            .map_err(map_repository_error)
    }

    /// Number of live commodities created during `year`.
    pub async fn count_by_year(&self, caller: &Caller, year: i32) -> Result<u64, Error> {
        caller.require_role(&[Role::Admin, Role::Validator])?;
        self.commodities
            .count_live_by_year(year)
            .await
            .map_err(map_repository_error)
    }

    async fn ensure_name_free(&self, owner_id: UserId, name: &str) -> Result<(), Error> {
        let taken = self
            .commodities
            .find_live_by_owner_and_name(owner_id, name.trim())
            .await
            .map_err(map_repository_error)?;
        match taken {
            Some(_) => Err(Error::conflict("commodity already exists")),
            None => Ok(()),
        }
    }

    async fn owned(&self, id: CommodityId, owner_id: UserId) -> Result<Commodity, Error> {
        let commodity = self.get(id).await?;
        if commodity.owner_id != owner_id {
            return Err(Error::not_found("commodity not found"));
        }
        Ok(commodity)
    }
}

#[cfg(test)]
#[path = "commodity_service_tests.rs"]
mod tests;
