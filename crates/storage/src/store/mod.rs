//! Persistence contract consumed by the scoring services.
//!
//! Every method is a single round trip to the backing store. Methods that
//! touch more than one row commit all or nothing, so readers see either the
//! previous or the new state.
//!
//! The cached `ideas.total_score` / `ideas.vote_count` columns are only ever
//! written by the store itself, in the same atomic step as the score or
//! criterion write that changed them, and always from a fresh recomputation
//! serialized per idea. Callers never write totals.

use async_trait::async_trait;
use uuid::Uuid;

use crate::dto::criteria::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::error::Result;
use crate::models::{Criterion, Idea, IdeaScore};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;

#[async_trait]
pub trait VotingStore: Send + Sync {
    /// Criteria of a hackathon ordered by `display_order`.
    async fn list_criteria(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>>;

    async fn find_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>>;

    /// Inserts and rewrites the totals of the hackathon's ideas.
    async fn insert_criterion(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion>;

    /// Fails with `NotFound` for unknown ids and `Conflict` when
    /// `expected_version` does not match. A blank description clears it.
    /// Rewrites the totals of the hackathon's ideas.
    async fn update_criterion(
        &self,
        criterion_id: Uuid,
        req: &UpdateCriterionRequest,
    ) -> Result<Criterion>;

    /// Deletes the criterion and, by cascade, every score given against it,
    /// then rewrites the totals of the hackathon's ideas.
    async fn delete_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>>;

    async fn reorder_criteria(
        &self,
        hackathon_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Criterion>>;

    async fn find_idea(&self, idea_id: Uuid) -> Result<Option<Idea>>;

    /// All ideas, or only those of `hackathon_id` when given.
    async fn list_ideas(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Idea>>;

    /// Recomputes and stores an idea's totals; `None` for an unknown idea.
    async fn refresh_idea_totals(&self, idea_id: Uuid) -> Result<Option<Idea>>;

    async fn idea_scores(&self, idea_id: Uuid) -> Result<Vec<IdeaScore>>;

    async fn user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<Vec<IdeaScore>>;

    async fn count_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<i64>;

    /// Deletes every `(idea_id, user_id)` row, inserts `scores` and rewrites
    /// the idea's totals atomically. Returns the idea with its new totals.
    async fn replace_user_scores(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        scores: &[(Uuid, i32)],
    ) -> Result<Idea>;

    /// Returns the number of rows removed; zero is not an error, including for
    /// an unknown idea. Totals are rewritten in the same step.
    async fn delete_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64>;
}
