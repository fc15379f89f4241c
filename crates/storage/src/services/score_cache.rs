use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::dto::aggregate::IdeaAggregate;
use crate::services::change_feed::{ChangeEvent, ChangeSubscription, ChangeTable, FeedError};

/// Idea aggregates keyed by idea id.
///
/// Every invalidation bumps a generation counter; a value computed before
/// the bump is discarded instead of stored.
#[derive(Debug, Default)]
pub struct ScoreCache {
    entries: RwLock<HashMap<Uuid, IdeaAggregate>>,
    generation: AtomicU64,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, idea_id: Uuid) -> Option<IdeaAggregate> {
        self.entries.read().await.get(&idea_id).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `aggregate` unless something was invalidated since `generation`.
    pub async fn insert_if_current(&self, aggregate: IdeaAggregate, generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        entries.insert(aggregate.idea_id, aggregate);
        true
    }

    pub async fn invalidate_idea(&self, idea_id: Uuid) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.remove(&idea_id);
    }

    pub async fn invalidate_hackathon(&self, hackathon_id: Uuid) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.retain(|_, aggregate| aggregate.hackathon_id != hackathon_id);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop whatever `event` may have made stale.
    pub async fn apply(&self, event: &ChangeEvent) {
        match (event.table, event.idea_id, event.hackathon_id) {
            (ChangeTable::IdeaScores, Some(idea_id), _) => self.invalidate_idea(idea_id).await,
            (ChangeTable::VotingCriteria, _, Some(hackathon_id)) => {
                self.invalidate_hackathon(hackathon_id).await
            }
            _ => self.clear().await,
        }
    }

    /// Keep the cache in step with a change subscription until the feed closes.
    pub fn spawn_listener(self: Arc<Self>, mut subscription: ChangeSubscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match subscription.recv().await {
                    Ok(event) => self.apply(&event).await,
                    Err(FeedError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Score cache lagged behind change feed, clearing");
                        self.clear().await;
                    }
                    Err(FeedError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::change_feed::ChangeKind;

    fn aggregate(idea_id: Uuid, hackathon_id: Uuid) -> IdeaAggregate {
        IdeaAggregate {
            idea_id,
            hackathon_id,
            criteria_stats: Vec::new(),
            weighted_total: 7.5,
            distinct_voters: 3,
        }
    }

    #[tokio::test]
    async fn stale_computation_is_not_stored() {
        let cache = ScoreCache::new();
        let idea = Uuid::new_v4();

        let generation = cache.generation();
        cache.invalidate_idea(Uuid::new_v4()).await;

        assert!(!cache.insert_if_current(aggregate(idea, Uuid::new_v4()), generation).await);
        assert!(cache.get(idea).await.is_none());
    }

    #[tokio::test]
    async fn criteria_events_drop_the_whole_hackathon() {
        let cache = ScoreCache::new();
        let (hackathon, other) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        for (idea, h) in [(a, hackathon), (b, hackathon), (c, other)] {
            let generation = cache.generation();
            assert!(cache.insert_if_current(aggregate(idea, h), generation).await);
        }

        cache
            .apply(&ChangeEvent::criteria(ChangeKind::Update, hackathon))
            .await;

        assert!(cache.get(a).await.is_none());
        assert!(cache.get(b).await.is_none());
        assert!(cache.get(c).await.is_some());

        cache.apply(&ChangeEvent::scores(ChangeKind::Delete, c)).await;
        assert!(cache.is_empty().await);
    }
}
