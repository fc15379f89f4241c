use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::criteria::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::error::{Result, StorageError};
use crate::models::{Criterion, Idea, IdeaScore};
use crate::services::aggregation;
use crate::store::VotingStore;

type ScoreKey = (Uuid, Uuid, Uuid);

#[derive(Debug, Default)]
struct MemoryState {
    criteria: BTreeMap<Uuid, Criterion>,
    ideas: BTreeMap<Uuid, Idea>,
    /// Keyed by `(idea_id, user_id, criteria_id)`.
    scores: BTreeMap<ScoreKey, IdeaScore>,
}

impl MemoryState {
    fn take_user_scores(&mut self, idea_id: Uuid, user_id: Uuid) -> Vec<IdeaScore> {
        let keys: Vec<ScoreKey> = self
            .scores
            .range((idea_id, user_id, Uuid::nil())..=(idea_id, user_id, Uuid::max()))
            .map(|(key, _)| *key)
            .collect();

        keys.into_iter()
            .filter_map(|key| self.scores.remove(&key))
            .collect()
    }

    fn restore(&mut self, rows: Vec<IdeaScore>) {
        for row in rows {
            self.scores
                .insert((row.idea_id, row.user_id, row.criteria_id), row);
        }
    }

    /// Rewrite an idea's cached totals from the rows currently held.
    fn refresh_totals(&mut self, idea_id: Uuid) -> Option<Idea> {
        let idea = self.ideas.get(&idea_id)?;
        let criteria = sorted_criteria(self, idea.hackathon_id);
        let scores: Vec<IdeaScore> = self
            .scores
            .values()
            .filter(|s| s.idea_id == idea_id)
            .cloned()
            .collect();
        let fresh = aggregation::aggregate(idea, &criteria, &scores);

        let idea = self.ideas.get_mut(&idea_id)?;
        idea.total_score = fresh.weighted_total;
        idea.vote_count = fresh.distinct_voters;
        Some(idea.clone())
    }

    fn refresh_hackathon_totals(&mut self, hackathon_id: Uuid) {
        let idea_ids: Vec<Uuid> = self
            .ideas
            .values()
            .filter(|idea| idea.hackathon_id == hackathon_id)
            .map(|idea| idea.idea_id)
            .collect();

        for idea_id in idea_ids {
            self.refresh_totals(idea_id);
        }
    }
}

/// In-process `VotingStore` used by tests and local tooling.
///
/// A single lock guards all tables, so multi-row writes, and the idea totals
/// they rewrite, are atomic with respect to readers and other writers. Faults can be injected between the delete and insert
/// halves of `replace_user_scores`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    replace_delay_ms: AtomicU64,
    fail_next_replace: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an idea; idea CRUD itself belongs to the surrounding app.
    pub async fn insert_idea(&self, hackathon_id: Uuid, title: &str) -> Idea {
        let idea = Idea {
            idea_id: Uuid::new_v4(),
            hackathon_id,
            title: title.to_string(),
            total_score: 0.0,
            vote_count: 0,
        };

        self.state
            .write()
            .await
            .ideas
            .insert(idea.idea_id, idea.clone());

        idea
    }

    /// Overwrite an idea's cached totals directly, as an out-of-band writer
    /// that bypasses the store would.
    pub async fn set_idea_totals(&self, idea_id: Uuid, total_score: f64, vote_count: i64) {
        if let Some(idea) = self.state.write().await.ideas.get_mut(&idea_id) {
            idea.total_score = total_score;
            idea.vote_count = vote_count;
        }
    }

    /// Hold the write lock for `delay` between deleting and inserting scores.
    pub fn set_replace_delay(&self, delay: Duration) {
        self.replace_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make the next `replace_user_scores` fail after its delete step.
    pub fn fail_next_replace(&self) {
        self.fail_next_replace.store(true, Ordering::SeqCst);
    }

    /// Simulate a store outage for every operation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn sorted_criteria(state: &MemoryState, hackathon_id: Uuid) -> Vec<Criterion> {
    let mut criteria: Vec<Criterion> = state
        .criteria
        .values()
        .filter(|c| c.hackathon_id == hackathon_id)
        .cloned()
        .collect();
    criteria.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    criteria
}

#[async_trait]
impl VotingStore for MemoryStore {
    async fn list_criteria(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(sorted_criteria(&state, hackathon_id))
    }

    async fn find_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        self.check_available()?;
        Ok(self.state.read().await.criteria.get(&criterion_id).cloned())
    }

    async fn insert_criterion(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let display_order = req.display_order.unwrap_or_else(|| {
            state
                .criteria
                .values()
                .filter(|c| c.hackathon_id == hackathon_id)
                .map(|c| c.display_order + 1)
                .max()
                .unwrap_or(0)
        });

        let criterion = Criterion {
            id: Uuid::new_v4(),
            hackathon_id,
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            weight: req.weight,
            display_order,
            version: 1,
            created_at: Utc::now().naive_utc(),
        };
        state.criteria.insert(criterion.id, criterion.clone());
        state.refresh_hackathon_totals(hackathon_id);

        Ok(criterion)
    }

    async fn update_criterion(
        &self,
        criterion_id: Uuid,
        req: &UpdateCriterionRequest,
    ) -> Result<Criterion> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let criterion = state
            .criteria
            .get_mut(&criterion_id)
            .ok_or(StorageError::NotFound)?;

        if let Some(expected) = req.expected_version
            && expected != criterion.version
        {
            return Err(StorageError::Conflict(format!(
                "criterion {} is at version {}, expected {}",
                criterion_id, criterion.version, expected
            )));
        }

        if let Some(name) = &req.name {
            criterion.name = name.trim().to_string();
        }
        if let Some(description) = &req.description {
            criterion.description = if description.trim().is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(weight) = req.weight {
            criterion.weight = weight;
        }
        if let Some(display_order) = req.display_order {
            criterion.display_order = display_order;
        }
        criterion.version += 1;

        let updated = criterion.clone();
        state.refresh_hackathon_totals(updated.hackathon_id);

        Ok(updated)
    }

    async fn delete_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let removed = state.criteria.remove(&criterion_id);

        if let Some(criterion) = &removed {
            state
                .scores
                .retain(|(_, _, criteria_id), _| *criteria_id != criterion_id);
            state.refresh_hackathon_totals(criterion.hackathon_id);
        }

        Ok(removed)
    }

    async fn reorder_criteria(
        &self,
        hackathon_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Criterion>> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let belongs = ordered_ids.iter().all(|id| {
            state
                .criteria
                .get(id)
                .is_some_and(|c| c.hackathon_id == hackathon_id)
        });
        if !belongs {
            return Err(StorageError::NotFound);
        }

        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(criterion) = state.criteria.get_mut(id) {
                criterion.display_order = position as i32;
                criterion.version += 1;
            }
        }

        Ok(sorted_criteria(&state, hackathon_id))
    }

    async fn find_idea(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        self.check_available()?;
        Ok(self.state.read().await.ideas.get(&idea_id).cloned())
    }

    async fn list_ideas(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Idea>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .ideas
            .values()
            .filter(|idea| hackathon_id.is_none_or(|h| idea.hackathon_id == h))
            .cloned()
            .collect())
    }

    async fn refresh_idea_totals(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        self.check_available()?;
        Ok(self.state.write().await.refresh_totals(idea_id))
    }

    async fn idea_scores(&self, idea_id: Uuid) -> Result<Vec<IdeaScore>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<Vec<IdeaScore>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .scores
            .range((idea_id, user_id, Uuid::nil())..=(idea_id, user_id, Uuid::max()))
            .map(|(_, score)| score.clone())
            .collect())
    }

    async fn count_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<i64> {
        Ok(self.user_scores(idea_id, user_id).await?.len() as i64)
    }

    async fn replace_user_scores(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        scores: &[(Uuid, i32)],
    ) -> Result<Idea> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if !state.ideas.contains_key(&idea_id) {
            return Err(StorageError::NotFound);
        }

        let previous = state.take_user_scores(idea_id, user_id);

        let delay = self.replace_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail_next_replace.swap(false, Ordering::SeqCst) {
            state.restore(previous);
            return Err(StorageError::Unavailable(
                "connection lost between delete and insert".to_string(),
            ));
        }

        if let Some((missing, _)) = scores
            .iter()
            .find(|(criteria_id, _)| !state.criteria.contains_key(criteria_id))
        {
            let message = format!("criterion {} does not exist", missing);
            state.restore(previous);
            return Err(StorageError::ConstraintViolation(message));
        }

        let created_at = Utc::now().naive_utc();
        for (criteria_id, score) in scores {
            state.scores.insert(
                (idea_id, user_id, *criteria_id),
                IdeaScore {
                    idea_id,
                    user_id,
                    criteria_id: *criteria_id,
                    score: *score,
                    created_at,
                },
            );
        }

        state.refresh_totals(idea_id).ok_or(StorageError::NotFound)
    }

    async fn delete_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let removed = state.take_user_scores(idea_id, user_id).len() as u64;

        if removed > 0 {
            state.refresh_totals(idea_id);
        }

        Ok(removed)
    }
}
