use async_trait::async_trait;
use sqlx::postgres::PgListener;
use uuid::Uuid;

use crate::Database;
use crate::dto::criteria::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::error::Result;
use crate::models::{Criterion, Idea, IdeaScore};
use crate::repository::criteria::CriteriaRepository;
use crate::repository::ideas::IdeaRepository;
use crate::repository::scores::ScoreRepository;
use crate::services::change_feed::{ChangeEvent, ChangeFeed};
use crate::store::VotingStore;

/// Channel the `voting_changes` triggers notify on.
pub const CHANGE_CHANNEL: &str = "voting_changes";

#[async_trait]
impl VotingStore for Database {
    async fn list_criteria(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>> {
        CriteriaRepository::new(self.pool()).list(hackathon_id).await
    }

    async fn find_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        CriteriaRepository::new(self.pool())
            .find_by_id(criterion_id)
            .await
    }

    async fn insert_criterion(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        CriteriaRepository::new(self.pool())
            .create(hackathon_id, req)
            .await
    }

    async fn update_criterion(
        &self,
        criterion_id: Uuid,
        req: &UpdateCriterionRequest,
    ) -> Result<Criterion> {
        CriteriaRepository::new(self.pool())
            .update(criterion_id, req)
            .await
    }

    async fn delete_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        CriteriaRepository::new(self.pool()).delete(criterion_id).await
    }

    async fn reorder_criteria(
        &self,
        hackathon_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Criterion>> {
        CriteriaRepository::new(self.pool())
            .reorder(hackathon_id, ordered_ids)
            .await
    }

    async fn find_idea(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        IdeaRepository::new(self.pool()).find_by_id(idea_id).await
    }

    async fn list_ideas(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Idea>> {
        IdeaRepository::new(self.pool()).list(hackathon_id).await
    }

    async fn refresh_idea_totals(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        IdeaRepository::new(self.pool()).refresh_totals(idea_id).await
    }

    async fn idea_scores(&self, idea_id: Uuid) -> Result<Vec<IdeaScore>> {
        ScoreRepository::new(self.pool()).for_idea(idea_id).await
    }

    async fn user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<Vec<IdeaScore>> {
        ScoreRepository::new(self.pool())
            .for_user(idea_id, user_id)
            .await
    }

    async fn count_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<i64> {
        ScoreRepository::new(self.pool())
            .count_for_user(idea_id, user_id)
            .await
    }

    async fn replace_user_scores(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        scores: &[(Uuid, i32)],
    ) -> Result<Idea> {
        ScoreRepository::new(self.pool())
            .replace_for_user(idea_id, user_id, scores)
            .await
    }

    async fn delete_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64> {
        ScoreRepository::new(self.pool())
            .delete_for_user(idea_id, user_id)
            .await
    }
}

impl Database {
    /// Forward row-level notifications from Postgres into `feed` until the
    /// listener connection fails.
    ///
    /// Picks up writes made by other processes against the same database.
    pub async fn forward_changes(&self, feed: ChangeFeed) -> Result<()> {
        let mut listener = PgListener::connect_with(self.pool()).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tracing::info!(channel = CHANGE_CHANNEL, "Listening for voting changes");

        loop {
            let notification = listener.recv().await?;

            match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                Ok(event) => {
                    tracing::debug!(?event, "Forwarding change notification");
                    feed.publish(event);
                }
                Err(e) => {
                    tracing::warn!(
                        payload = notification.payload(),
                        "Ignoring malformed change notification: {}",
                        e
                    );
                }
            }
        }
    }
}
