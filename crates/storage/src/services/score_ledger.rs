use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;
use validator::Validate;

use crate::dto::scores::SubmitScoresRequest;
use crate::error::{Result, StorageError};
use crate::models::Idea;
use crate::store::VotingStore;

/// Per-user, per-criterion scores of ideas.
///
/// A submission replaces the user's whole score set for the idea; it does
/// not merge with what was there before. Completeness against the current
/// rubric is not enforced here.
pub struct ScoreLedger<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ScoreLedger<'a, S>
where
    S: VotingStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Criterion id to score; empty when the user has not voted
    pub async fn get_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<BTreeMap<Uuid, i32>> {
        let rows = self.store.user_scores(idea_id, user_id).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.criteria_id, row.score))
            .collect())
    }

    /// Validate the whole batch, then atomically replace the user's scores.
    ///
    /// Returns the idea with the totals written alongside the new scores.
    pub async fn submit(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        req: &SubmitScoresRequest,
    ) -> Result<Idea> {
        req.validate()?;

        let idea = self
            .store
            .find_idea(idea_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let rubric: HashSet<Uuid> = self
            .store
            .list_criteria(idea.hackathon_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        if let Some(unknown) = req.scores.keys().find(|id| !rubric.contains(id)) {
            tracing::debug!(%idea_id, criterion_id = %unknown, "Score for unknown criterion");
            return Err(StorageError::NotFound);
        }

        let rows: Vec<(Uuid, i32)> = req.scores.iter().map(|(id, score)| (*id, *score)).collect();
        let idea = self
            .store
            .replace_user_scores(idea_id, user_id, &rows)
            .await?;

        tracing::info!(%idea_id, %user_id, criteria = rows.len(), "Stored vote");

        Ok(idea)
    }

    /// Withdraw a vote and return the number of scores removed; removing an
    /// absent vote is a no-op
    pub async fn remove(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64> {
        let removed = self.store.delete_user_scores(idea_id, user_id).await?;
        tracing::info!(%idea_id, %user_id, removed, "Removed vote");

        Ok(removed)
    }

    /// True when at least one score exists, even if the vote is partial
    pub async fn has_voted(&self, idea_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.store.count_user_scores(idea_id, user_id).await? > 0)
    }
}
