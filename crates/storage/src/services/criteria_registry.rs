use std::collections::HashSet;

use uuid::Uuid;
use validator::Validate;

use crate::dto::criteria::{
    self, CreateCriterionRequest, CriteriaOverview, ReorderCriteriaRequest, TOTAL_WEIGHT,
    UpdateCriterionRequest,
};
use crate::error::{Result, StorageError};
use crate::models::Criterion;
use crate::store::VotingStore;

/// Owns the scoring rubric of each hackathon.
///
/// Writes are validated one criterion at a time. The cross-criterion rule
/// (weights sum to 100) is reported through `total_weight` and `is_valid`
/// and never blocks a write, so a rubric can pass through invalid states
/// while a manager rebalances it.
pub struct CriteriaRegistry<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> CriteriaRegistry<'a, S>
where
    S: VotingStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Criteria by ascending display order; empty means voting is not configured
    pub async fn list(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>> {
        self.store.list_criteria(hackathon_id).await
    }

    pub async fn overview(&self, hackathon_id: Uuid) -> Result<CriteriaOverview> {
        Ok(CriteriaOverview::new(self.list(hackathon_id).await?))
    }

    pub async fn create(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        req.validate()?;

        let criterion = self.store.insert_criterion(hackathon_id, req).await?;
        tracing::info!(
            %hackathon_id,
            criterion_id = %criterion.id,
            weight = criterion.weight,
            "Created voting criterion"
        );

        Ok(criterion)
    }

    pub async fn update(&self, id: Uuid, req: &UpdateCriterionRequest) -> Result<Criterion> {
        req.validate()?;

        let criterion = self.store.update_criterion(id, req).await?;
        tracing::info!(
            criterion_id = %id,
            version = criterion.version,
            "Updated voting criterion"
        );

        Ok(criterion)
    }

    /// Idempotent: deleting an unknown id returns `Ok(None)`
    pub async fn delete(&self, id: Uuid) -> Result<Option<Criterion>> {
        let deleted = self.store.delete_criterion(id).await?;
        match &deleted {
            Some(criterion) => tracing::info!(
                criterion_id = %id,
                hackathon_id = %criterion.hackathon_id,
                "Deleted voting criterion"
            ),
            None => tracing::debug!(criterion_id = %id, "Criterion already absent"),
        }

        Ok(deleted)
    }

    /// Assign `display_order` from each id's position in the request
    pub async fn reorder(
        &self,
        hackathon_id: Uuid,
        req: &ReorderCriteriaRequest,
    ) -> Result<Vec<Criterion>> {
        req.validate()?;

        let mut seen = HashSet::with_capacity(req.criteria_ids.len());
        if !req.criteria_ids.iter().all(|id| seen.insert(*id)) {
            return Err(StorageError::validation(
                "criteria_ids: Each criterion may appear only once",
            ));
        }

        self.store
            .reorder_criteria(hackathon_id, &req.criteria_ids)
            .await
    }

    pub async fn total_weight(&self, hackathon_id: Uuid) -> Result<i64> {
        Ok(criteria::total_weight(&self.list(hackathon_id).await?))
    }

    pub async fn has_criteria(&self, hackathon_id: Uuid) -> Result<bool> {
        Ok(!self.list(hackathon_id).await?.is_empty())
    }

    /// True only for a configured rubric whose weights sum to exactly 100
    pub async fn is_valid(&self, hackathon_id: Uuid) -> Result<bool> {
        Ok(self.total_weight(hackathon_id).await? == TOTAL_WEIGHT)
    }
}
