mod common;

use common::{add_criterion, fixture, scores};
use uuid::Uuid;
use voting_storage::services::score_ledger::ScoreLedger;
use voting_storage::services::voting_state::get_voting_state;

#[tokio::test]
async fn fresh_user_has_not_voted() {
    let fx = fixture().await;
    add_criterion(&fx, "Impact", 100).await;

    let state = get_voting_state(&fx.store, fx.idea.idea_id, fx.hackathon_id, Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(state.criteria.len(), 1);
    assert!(state.user_scores.is_empty());
    assert!(!state.has_voted);
    assert!(!state.is_complete);
}

#[tokio::test]
async fn partial_vote_counts_as_voted_but_not_complete() {
    let fx = fixture().await;
    let a = add_criterion(&fx, "A", 50).await;
    add_criterion(&fx, "B", 50).await;
    let ledger = ScoreLedger::new(&fx.store);
    let user = Uuid::new_v4();

    ledger
        .submit(fx.idea.idea_id, user, &scores(&[(&a, 7)]))
        .await
        .unwrap();

    let state = get_voting_state(&fx.store, fx.idea.idea_id, fx.hackathon_id, user)
        .await
        .unwrap();

    assert!(ledger.has_voted(fx.idea.idea_id, user).await.unwrap());
    assert!(state.has_voted);
    assert!(!state.is_complete);
}

#[tokio::test]
async fn adding_a_criterion_after_voting_makes_the_vote_incomplete() {
    let fx = fixture().await;
    let a = add_criterion(&fx, "A", 100).await;
    let user = Uuid::new_v4();

    ScoreLedger::new(&fx.store)
        .submit(fx.idea.idea_id, user, &scores(&[(&a, 7)]))
        .await
        .unwrap();

    let before = get_voting_state(&fx.store, fx.idea.idea_id, fx.hackathon_id, user)
        .await
        .unwrap();
    assert!(before.is_complete);

    add_criterion(&fx, "B", 20).await;

    let after = get_voting_state(&fx.store, fx.idea.idea_id, fx.hackathon_id, user)
        .await
        .unwrap();
    assert!(after.has_voted);
    assert!(!after.is_complete);
    assert_eq!(after.user_scores.get(&a.id), Some(&7));
}
