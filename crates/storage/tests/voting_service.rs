mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{InstrumentedStore, assert_close, criterion_request};
use uuid::Uuid;
use voting_storage::dto::common::PaginationParams;
use voting_storage::dto::criteria::UpdateCriterionRequest;
use voting_storage::dto::scores::SubmitScoresRequest;
use voting_storage::models::Criterion;
use voting_storage::services::aggregation;
use voting_storage::services::change_feed::{
    ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, ChangeTable,
};
use voting_storage::services::score_cache::ScoreCache;
use voting_storage::{MemoryStore, StorageError, VotingService, VotingStore};

struct Harness {
    store: Arc<MemoryStore>,
    service: VotingService,
    cache: Arc<ScoreCache>,
    hackathon_id: Uuid,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(ScoreCache::new());
    let service = VotingService::new(store.clone(), ChangeFeed::new(64)).with_cache(cache.clone());

    Harness {
        store,
        service,
        cache,
        hackathon_id: Uuid::new_v4(),
    }
}

fn vote(pairs: &[(&Criterion, i32)]) -> SubmitScoresRequest {
    SubmitScoresRequest {
        scores: pairs.iter().map(|(c, s)| (c.id, *s)).collect(),
    }
}

#[tokio::test]
async fn idea_totals_follow_every_write() {
    let h = harness();
    let idea = h.store.insert_idea(h.hackathon_id, "Bike share").await;
    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 60))
        .await
        .unwrap();
    let pitch = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Pitch", 40))
        .await
        .unwrap();

    let user = Uuid::new_v4();
    let committed = h
        .service
        .submit_scores(idea.idea_id, user, &vote(&[(&impact, 8), (&pitch, 6)]))
        .await
        .unwrap();
    assert_close(committed.total_score, 7.2);
    assert_eq!(committed.vote_count, 1);

    let stored = h.store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_close(stored.total_score, 7.2);
    assert_eq!(stored.vote_count, 1);

    // A weight change alters the total without any new score.
    h.service
        .update_criterion(
            impact.id,
            &UpdateCriterionRequest {
                weight: Some(40),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let stored = h.store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_close(stored.total_score, 8.0 * 0.4 + 6.0 * 0.4);

    h.service.remove_vote(idea.idea_id, user).await.unwrap();
    let stored = h.store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_eq!(stored.vote_count, 0);
    assert_eq!(stored.total_score, 0.0);
}

#[tokio::test]
async fn cache_is_invalidated_by_local_writes() {
    let h = harness();
    let idea = h.store.insert_idea(h.hackathon_id, "Repair cafe").await;
    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();

    let empty = h.service.idea_aggregate(idea.idea_id).await.unwrap();
    assert_eq!(empty.distinct_voters, 0);
    assert!(h.cache.get(idea.idea_id).await.is_some());

    h.service
        .submit_scores(idea.idea_id, Uuid::new_v4(), &vote(&[(&impact, 9)]))
        .await
        .unwrap();
    assert!(h.cache.get(idea.idea_id).await.is_none());

    let fresh = h.service.idea_aggregate(idea.idea_id).await.unwrap();
    assert_eq!(fresh.distinct_voters, 1);
    assert_close(fresh.weighted_total, 9.0);

    h.service.delete_criterion(impact.id).await.unwrap();
    let after_delete = h.service.idea_aggregate(idea.idea_id).await.unwrap();
    assert!(after_delete.criteria_stats.is_empty());
    assert_eq!(after_delete.distinct_voters, 0);
}

#[tokio::test]
async fn cache_listener_reacts_to_external_changes() {
    let h = harness();
    let idea = h.store.insert_idea(h.hackathon_id, "Seed library").await;
    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();
    h.service.idea_aggregate(idea.idea_id).await.unwrap();

    let listener = h
        .cache
        .clone()
        .spawn_listener(h.service.feed().subscribe(ChangeFilter::all()));

    // Another process writes straight to the store and notifies the feed.
    h.store
        .replace_user_scores(idea.idea_id, Uuid::new_v4(), &[(impact.id, 4)])
        .await
        .unwrap();
    h.service
        .feed()
        .publish(ChangeEvent::scores(ChangeKind::Insert, idea.idea_id));

    let mut invalidated = false;
    for _ in 0..50 {
        if h.cache.get(idea.idea_id).await.is_none() {
            invalidated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(invalidated, "listener never dropped the stale entry");

    let fresh = h.service.idea_aggregate(idea.idea_id).await.unwrap();
    assert_eq!(fresh.distinct_voters, 1);

    listener.abort();
}

#[tokio::test]
async fn writes_publish_filtered_change_events() {
    let h = harness();
    let idea = h.store.insert_idea(h.hackathon_id, "Tool library").await;
    let mut score_events = h
        .service
        .feed()
        .subscribe(ChangeFilter::table(ChangeTable::IdeaScores).idea(idea.idea_id));
    let mut criteria_events = h
        .service
        .feed()
        .subscribe(ChangeFilter::table(ChangeTable::VotingCriteria).hackathon(h.hackathon_id));

    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();
    h.service
        .submit_scores(idea.idea_id, Uuid::new_v4(), &vote(&[(&impact, 5)]))
        .await
        .unwrap();

    let criteria_event = criteria_events.recv().await.unwrap();
    assert_eq!(criteria_event.kind, ChangeKind::Insert);
    assert_eq!(criteria_event.hackathon_id, Some(h.hackathon_id));

    let score_event = score_events.recv().await.unwrap();
    assert_eq!(score_event, ChangeEvent::scores(ChangeKind::Insert, idea.idea_id));
}

#[tokio::test]
async fn leaderboard_ranks_by_weighted_total() {
    let h = harness();
    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();
    let low = h.store.insert_idea(h.hackathon_id, "low").await;
    let high = h.store.insert_idea(h.hackathon_id, "high").await;
    let unvoted = h.store.insert_idea(h.hackathon_id, "unvoted").await;
    h.store.insert_idea(Uuid::new_v4(), "other hackathon").await;

    h.service
        .submit_scores(low.idea_id, Uuid::new_v4(), &vote(&[(&impact, 3)]))
        .await
        .unwrap();
    h.service
        .submit_scores(high.idea_id, Uuid::new_v4(), &vote(&[(&impact, 9)]))
        .await
        .unwrap();

    let (entries, total) = h
        .service
        .leaderboard(h.hackathon_id, &PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(total, 3);
    let order: Vec<Uuid> = entries.iter().map(|e| e.idea_id).collect();
    assert_eq!(order, [high.idea_id, low.idea_id, unvoted.idea_id]);
    assert_eq!(entries[0].rank, 1);

    let (page, _) = h
        .service
        .leaderboard(
            h.hackathon_id,
            &PaginationParams {
                page: 2,
                page_size: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].rank, 3);
}

#[tokio::test]
async fn recompute_all_repairs_drifted_totals() {
    let h = harness();
    let idea = h.store.insert_idea(h.hackathon_id, "Drifted").await;
    let impact = h
        .service
        .create_criterion(h.hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();
    h.service
        .submit_scores(idea.idea_id, Uuid::new_v4(), &vote(&[(&impact, 6)]))
        .await
        .unwrap();

    h.store.set_idea_totals(idea.idea_id, 99.0, 42).await;

    let count = h.service.recompute_all().await.unwrap();
    assert_eq!(count, 1);

    let stored = h.store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_close(stored.total_score, 6.0);
    assert_eq!(stored.vote_count, 1);
}

#[tokio::test]
async fn voting_state_for_unknown_idea_is_not_found() {
    let h = harness();
    let err = h
        .service
        .voting_state(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

async fn assert_totals_are_fresh(store: &InstrumentedStore, idea_id: Uuid) {
    let stored = store.find_idea(idea_id).await.unwrap().unwrap();
    let fresh = aggregation::compute_for_idea(store, idea_id).await.unwrap();
    assert_eq!(stored.vote_count, fresh.distinct_voters);
    assert_close(stored.total_score, fresh.weighted_total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_voters_leave_totals_matching_a_fresh_aggregate() {
    let store = Arc::new(InstrumentedStore::new());
    let service = Arc::new(VotingService::new(store.clone(), ChangeFeed::new(64)));
    let hackathon_id = Uuid::new_v4();
    let idea = store.inner.insert_idea(hackathon_id, "Shared ovens").await;
    let impact = service
        .create_criterion(hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();

    // The first voter's write lands, then it stalls while a second voter
    // completes a whole submission.
    store.hold_first_replace(Duration::from_millis(200));
    let slow = {
        let service = service.clone();
        let impact = impact.clone();
        let idea_id = idea.idea_id;
        tokio::spawn(async move {
            service
                .submit_scores(idea_id, Uuid::new_v4(), &vote(&[(&impact, 4)]))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    service
        .submit_scores(idea.idea_id, Uuid::new_v4(), &vote(&[(&impact, 10)]))
        .await
        .unwrap();
    slow.await.unwrap().unwrap();

    let stored = store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_eq!(stored.vote_count, 2);
    assert_close(stored.total_score, 7.0);
    assert_totals_are_fresh(&store, idea.idea_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_of_voters_keeps_totals_consistent() {
    let store = Arc::new(InstrumentedStore::new());
    let service = Arc::new(VotingService::new(store.clone(), ChangeFeed::new(256)));
    let hackathon_id = Uuid::new_v4();
    let idea = store.inner.insert_idea(hackathon_id, "Community fridge").await;
    let impact = service
        .create_criterion(hackathon_id, &criterion_request("Impact", 70))
        .await
        .unwrap();
    let design = service
        .create_criterion(hackathon_id, &criterion_request("Design", 30))
        .await
        .unwrap();

    let mut voters = tokio::task::JoinSet::new();
    for n in 0..16 {
        let service = service.clone();
        let (impact, design) = (impact.clone(), design.clone());
        let idea_id = idea.idea_id;
        voters.spawn(async move {
            let score = n % 10 + 1;
            service
                .submit_scores(
                    idea_id,
                    Uuid::new_v4(),
                    &vote(&[(&impact, score), (&design, 11 - score)]),
                )
                .await
        });
    }
    while let Some(outcome) = voters.join_next().await {
        outcome.unwrap().unwrap();
    }

    let stored = store.find_idea(idea.idea_id).await.unwrap().unwrap();
    assert_eq!(stored.vote_count, 16);
    assert_totals_are_fresh(&store, idea.idea_id).await;
}

#[tokio::test]
async fn committed_vote_is_reported_even_when_standalone_refresh_fails() {
    let store = Arc::new(InstrumentedStore::new());
    let service = VotingService::new(store.clone(), ChangeFeed::new(64));
    let hackathon_id = Uuid::new_v4();
    let idea = store.inner.insert_idea(hackathon_id, "Seed library").await;
    let impact = service
        .create_criterion(hackathon_id, &criterion_request("Impact", 100))
        .await
        .unwrap();
    store.fail_refresh(true);

    let user = Uuid::new_v4();
    let committed = service
        .submit_scores(idea.idea_id, user, &vote(&[(&impact, 6)]))
        .await
        .unwrap();
    assert_close(committed.total_score, 6.0);
    assert_eq!(store.count_user_scores(idea.idea_id, user).await.unwrap(), 1);
    assert_totals_are_fresh(&store, idea.idea_id).await;

    // Rubric edits commit their totals too.
    service
        .create_criterion(hackathon_id, &criterion_request("Pitch", 50))
        .await
        .unwrap();
    assert_totals_are_fresh(&store, idea.idea_id).await;

    service.remove_vote(idea.idea_id, user).await.unwrap();
    assert_totals_are_fresh(&store, idea.idea_id).await;

    // Only the explicit repair pass uses the standalone refresh.
    let err = service.recompute_all().await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn removing_a_vote_on_an_unknown_idea_is_a_no_op() {
    let h = harness();
    let mut events = h.service.feed().subscribe(ChangeFilter::all());

    h.service
        .remove_vote(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    let next = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
    assert!(next.is_err(), "nothing should be published");
}
