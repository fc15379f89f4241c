use uuid::Uuid;

use crate::dto::voting_state::VotingState;
use crate::error::Result;
use crate::services::criteria_registry::CriteriaRegistry;
use crate::services::score_ledger::ScoreLedger;
use crate::store::VotingStore;

/// Rubric, the user's current scores, and whether they have voted.
///
/// Drives the choice between "Vote" and "Edit / Remove vote".
pub async fn get_voting_state<S>(
    store: &S,
    idea_id: Uuid,
    hackathon_id: Uuid,
    user_id: Uuid,
) -> Result<VotingState>
where
    S: VotingStore + ?Sized,
{
    let criteria = CriteriaRegistry::new(store).list(hackathon_id).await?;
    let user_scores = ScoreLedger::new(store)
        .get_user_scores(idea_id, user_id)
        .await?;

    Ok(VotingState::new(criteria, user_scores))
}
