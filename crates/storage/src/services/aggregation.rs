use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::dto::aggregate::{CriterionStat, IdeaAggregate};
use crate::error::{Result, StorageError};
use crate::models::{Criterion, Idea, IdeaScore};
use crate::store::VotingStore;

/// Derive the score picture of an idea from its rubric and score rows.
///
/// weighted_total = Σ mean(criterion) × weight / 100
///
/// A criterion nobody scored reports a mean of 0 and contributes 0. Scores
/// against criteria outside the rubric do not feed any statistic, while
/// `distinct_voters` counts every user with at least one row.
pub fn aggregate(idea: &Idea, criteria: &[Criterion], scores: &[IdeaScore]) -> IdeaAggregate {
    let mut sums: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for score in scores {
        let entry = sums.entry(score.criteria_id).or_insert((0, 0));
        entry.0 += i64::from(score.score);
        entry.1 += 1;
    }

    let criteria_stats: Vec<CriterionStat> = criteria
        .iter()
        .map(|criterion| {
            let (sum, count) = sums.get(&criterion.id).copied().unwrap_or((0, 0));
            let mean_score = if count > 0 {
                sum as f64 / count as f64
            } else {
                0.0
            };

            CriterionStat {
                criteria_id: criterion.id,
                name: criterion.name.clone(),
                weight: criterion.weight,
                mean_score,
                respondent_count: count,
            }
        })
        .collect();

    let weighted_total = criteria_stats
        .iter()
        .map(|stat| stat.mean_score * f64::from(stat.weight) / 100.0)
        .sum();

    let distinct_voters = scores
        .iter()
        .map(|s| s.user_id)
        .collect::<BTreeSet<_>>()
        .len() as i64;

    IdeaAggregate {
        idea_id: idea.idea_id,
        hackathon_id: idea.hackathon_id,
        criteria_stats,
        weighted_total,
        distinct_voters,
    }
}

/// Recompute an idea's aggregate from current store state
pub async fn compute_for_idea<S>(store: &S, idea_id: Uuid) -> Result<IdeaAggregate>
where
    S: VotingStore + ?Sized,
{
    let idea = store
        .find_idea(idea_id)
        .await?
        .ok_or(StorageError::NotFound)?;

    let criteria = store.list_criteria(idea.hackathon_id).await?;
    let scores = store.idea_scores(idea_id).await?;

    tracing::debug!(
        %idea_id,
        criteria = criteria.len(),
        rows = scores.len(),
        "Computing idea aggregate"
    );

    Ok(aggregate(&idea, &criteria, &scores))
}
