#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;
use voting_storage::dto::criteria::{CreateCriterionRequest, UpdateCriterionRequest};
use voting_storage::dto::scores::SubmitScoresRequest;
use voting_storage::models::{Criterion, Idea, IdeaScore};
use voting_storage::{MemoryStore, Result, StorageError, VotingStore};
use voting_storage::services::criteria_registry::CriteriaRegistry;

pub struct Fixture {
    pub store: MemoryStore,
    pub hackathon_id: Uuid,
    pub idea: Idea,
}

pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let hackathon_id = Uuid::new_v4();
    let idea = store.insert_idea(hackathon_id, "Neighbourhood tool library").await;

    Fixture {
        store,
        hackathon_id,
        idea,
    }
}

pub fn criterion_request(name: &str, weight: i32) -> CreateCriterionRequest {
    CreateCriterionRequest {
        name: name.to_string(),
        description: None,
        weight,
        display_order: None,
    }
}

pub async fn add_criterion(fx: &Fixture, name: &str, weight: i32) -> Criterion {
    CriteriaRegistry::new(&fx.store)
        .create(fx.hackathon_id, &criterion_request(name, weight))
        .await
        .expect("criterion created")
}

pub fn scores(pairs: &[(&Criterion, i32)]) -> SubmitScoresRequest {
    SubmitScoresRequest {
        scores: pairs.iter().map(|(c, s)| (c.id, *s)).collect(),
    }
}

pub fn score_map(pairs: &[(&Criterion, i32)]) -> BTreeMap<Uuid, i32> {
    pairs.iter().map(|(c, s)| (c.id, *s)).collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// `MemoryStore` wrapper that stalls a caller after its score write has
/// committed, and can make the standalone totals refresh fail.
#[derive(Default)]
pub struct InstrumentedStore {
    pub inner: MemoryStore,
    hold_after_first_replace: Mutex<Option<Duration>>,
    fail_refresh: AtomicBool,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `replace_user_scores` caller sleeps for `delay` once its
    /// write has landed, before returning.
    pub fn hold_first_replace(&self, delay: Duration) {
        *self.hold_after_first_replace.lock().unwrap() = Some(delay);
    }

    pub fn fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VotingStore for InstrumentedStore {
    async fn list_criteria(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>> {
        self.inner.list_criteria(hackathon_id).await
    }

    async fn find_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        self.inner.find_criterion(criterion_id).await
    }

    async fn insert_criterion(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        self.inner.insert_criterion(hackathon_id, req).await
    }

    async fn update_criterion(
        &self,
        criterion_id: Uuid,
        req: &UpdateCriterionRequest,
    ) -> Result<Criterion> {
        self.inner.update_criterion(criterion_id, req).await
    }

    async fn delete_criterion(&self, criterion_id: Uuid) -> Result<Option<Criterion>> {
        self.inner.delete_criterion(criterion_id).await
    }

    async fn reorder_criteria(
        &self,
        hackathon_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<Criterion>> {
        self.inner.reorder_criteria(hackathon_id, ordered_ids).await
    }

    async fn find_idea(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        self.inner.find_idea(idea_id).await
    }

    async fn list_ideas(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Idea>> {
        self.inner.list_ideas(hackathon_id).await
    }

    async fn refresh_idea_totals(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("refresh connection dropped".to_string()));
        }
        self.inner.refresh_idea_totals(idea_id).await
    }

    async fn idea_scores(&self, idea_id: Uuid) -> Result<Vec<IdeaScore>> {
        self.inner.idea_scores(idea_id).await
    }

    async fn user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<Vec<IdeaScore>> {
        self.inner.user_scores(idea_id, user_id).await
    }

    async fn count_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<i64> {
        self.inner.count_user_scores(idea_id, user_id).await
    }

    async fn replace_user_scores(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        scores: &[(Uuid, i32)],
    ) -> Result<Idea> {
        let result = self.inner.replace_user_scores(idea_id, user_id, scores).await;

        let hold = self.hold_after_first_replace.lock().unwrap().take();
        if let Some(delay) = hold {
            tokio::time::sleep(delay).await;
        }

        result
    }

    async fn delete_user_scores(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64> {
        self.inner.delete_user_scores(idea_id, user_id).await
    }
}
