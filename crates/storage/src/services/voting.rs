use std::sync::Arc;

use uuid::Uuid;

use crate::dto::aggregate::IdeaAggregate;
use crate::dto::common::PaginationParams;
use crate::dto::criteria::{
    CreateCriterionRequest, CriteriaOverview, ReorderCriteriaRequest, UpdateCriterionRequest,
};
use crate::dto::leaderboard::LeaderboardEntry;
use crate::dto::scores::SubmitScoresRequest;
use crate::dto::voting_state::VotingState;
use crate::error::{Result, StorageError};
use crate::models::{Criterion, Idea};
use crate::services::aggregation;
use crate::services::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::services::criteria_registry::CriteriaRegistry;
use crate::services::leaderboard;
use crate::services::score_cache::ScoreCache;
use crate::services::score_ledger::ScoreLedger;
use crate::services::voting_state;
use crate::store::VotingStore;

/// Entry point used by the HTTP layer.
///
/// Wraps the registry, ledger and aggregator. The store rewrites the idea's
/// `total_score` / `vote_count` columns inside each write; once a write has
/// committed the service only invalidates the aggregate cache and publishes a
/// change event, neither of which can fail.
pub struct VotingService {
    store: Arc<dyn VotingStore>,
    cache: Option<Arc<ScoreCache>>,
    feed: ChangeFeed,
}

impl VotingService {
    pub fn new(store: Arc<dyn VotingStore>, feed: ChangeFeed) -> Self {
        Self {
            store,
            cache: None,
            feed,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &dyn VotingStore {
        self.store.as_ref()
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn cache(&self) -> Option<&Arc<ScoreCache>> {
        self.cache.as_ref()
    }

    fn registry(&self) -> CriteriaRegistry<'_, dyn VotingStore> {
        CriteriaRegistry::new(self.store.as_ref())
    }

    fn ledger(&self) -> ScoreLedger<'_, dyn VotingStore> {
        ScoreLedger::new(self.store.as_ref())
    }

    pub async fn criteria_overview(&self, hackathon_id: Uuid) -> Result<CriteriaOverview> {
        self.registry().overview(hackathon_id).await
    }

    pub async fn create_criterion(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        let criterion = self.registry().create(hackathon_id, req).await?;
        self.after_criteria_write(hackathon_id, ChangeKind::Insert)
            .await;
        Ok(criterion)
    }

    pub async fn update_criterion(
        &self,
        criterion_id: Uuid,
        req: &UpdateCriterionRequest,
    ) -> Result<Criterion> {
        let criterion = self.registry().update(criterion_id, req).await?;
        self.after_criteria_write(criterion.hackathon_id, ChangeKind::Update)
            .await;
        Ok(criterion)
    }

    pub async fn delete_criterion(&self, criterion_id: Uuid) -> Result<()> {
        if let Some(deleted) = self.registry().delete(criterion_id).await? {
            self.after_criteria_write(deleted.hackathon_id, ChangeKind::Delete)
                .await;
        }
        Ok(())
    }

    pub async fn reorder_criteria(
        &self,
        hackathon_id: Uuid,
        req: &ReorderCriteriaRequest,
    ) -> Result<Vec<Criterion>> {
        let criteria = self.registry().reorder(hackathon_id, req).await?;
        self.after_criteria_write(hackathon_id, ChangeKind::Update)
            .await;
        Ok(criteria)
    }

    /// Voting state for the idea's own hackathon rubric
    pub async fn voting_state(&self, idea_id: Uuid, user_id: Uuid) -> Result<VotingState> {
        let idea = self
            .store
            .find_idea(idea_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        voting_state::get_voting_state(self.store(), idea_id, idea.hackathon_id, user_id).await
    }

    /// Replace the user's vote and return the idea with the totals committed
    /// alongside it
    pub async fn submit_scores(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        req: &SubmitScoresRequest,
    ) -> Result<Idea> {
        let idea = self.ledger().submit(idea_id, user_id, req).await?;
        self.after_score_write(idea_id, ChangeKind::Insert).await;
        Ok(idea)
    }

    /// Withdraw the user's vote; a missing vote or idea is a no-op
    pub async fn remove_vote(&self, idea_id: Uuid, user_id: Uuid) -> Result<()> {
        if self.ledger().remove(idea_id, user_id).await? > 0 {
            self.after_score_write(idea_id, ChangeKind::Delete).await;
        }
        Ok(())
    }

    pub async fn idea_aggregate(&self, idea_id: Uuid) -> Result<IdeaAggregate> {
        let Some(cache) = &self.cache else {
            return aggregation::compute_for_idea(self.store(), idea_id).await;
        };

        if let Some(hit) = cache.get(idea_id).await {
            return Ok(hit);
        }

        let generation = cache.generation();
        let aggregate = aggregation::compute_for_idea(self.store(), idea_id).await?;
        cache.insert_if_current(aggregate.clone(), generation).await;

        Ok(aggregate)
    }

    /// Ranked page of a hackathon's ideas, plus the total number of ideas
    pub async fn leaderboard(
        &self,
        hackathon_id: Uuid,
        pagination: &PaginationParams,
    ) -> Result<(Vec<LeaderboardEntry>, i64)> {
        let ideas = self.store.list_ideas(Some(hackathon_id)).await?;
        let total_items = ideas.len() as i64;

        let mut scored = Vec::with_capacity(ideas.len());
        for idea in ideas {
            let aggregate = self.idea_aggregate(idea.idea_id).await?;
            scored.push((idea, aggregate));
        }

        let entries = leaderboard::rank_ideas(scored)
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit())
            .collect();

        Ok((entries, total_items))
    }

    /// Rebuild the cached totals of every idea from current scores
    pub async fn recompute_all(&self) -> Result<u64> {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }

        let ideas = self.store.list_ideas(None).await?;
        let mut count = 0u64;

        for idea in ideas {
            if self.store.refresh_idea_totals(idea.idea_id).await?.is_some() {
                count += 1;
            }
        }

        tracing::info!(count, "Recomputed idea totals");
        Ok(count)
    }

    async fn after_score_write(&self, idea_id: Uuid, kind: ChangeKind) {
        if let Some(cache) = &self.cache {
            cache.invalidate_idea(idea_id).await;
        }
        self.feed.publish(ChangeEvent::scores(kind, idea_id));
    }

    async fn after_criteria_write(&self, hackathon_id: Uuid, kind: ChangeKind) {
        if let Some(cache) = &self.cache {
            cache.invalidate_hackathon(hackathon_id).await;
        }
        self.feed.publish(ChangeEvent::criteria(kind, hackathon_id));
    }
}
