use std::cmp::Ordering;

use crate::dto::aggregate::IdeaAggregate;
use crate::dto::leaderboard::LeaderboardEntry;
use crate::models::Idea;

/// Rank ideas by weighted total, then by voter count, then by id.
///
/// Every idea gets a distinct rank starting at 1.
pub fn rank_ideas(mut scored: Vec<(Idea, IdeaAggregate)>) -> Vec<LeaderboardEntry> {
    scored.sort_by(|(a_idea, a), (b_idea, b)| {
        b.weighted_total
            .partial_cmp(&a.weighted_total)
            .unwrap_or(Ordering::Equal)
            .then(b.distinct_voters.cmp(&a.distinct_voters))
            .then(a_idea.idea_id.cmp(&b_idea.idea_id))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (idea, aggregate))| LeaderboardEntry {
            rank: index as i64 + 1,
            idea_id: idea.idea_id,
            title: idea.title,
            weighted_total: aggregate.weighted_total,
            distinct_voters: aggregate.distinct_voters,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scored(title: &str, total: f64, voters: i64) -> (Idea, IdeaAggregate) {
        let idea = Idea {
            idea_id: Uuid::new_v4(),
            hackathon_id: Uuid::nil(),
            title: title.to_string(),
            total_score: 0.0,
            vote_count: 0,
        };
        let aggregate = IdeaAggregate {
            idea_id: idea.idea_id,
            hackathon_id: idea.hackathon_id,
            criteria_stats: Vec::new(),
            weighted_total: total,
            distinct_voters: voters,
        };
        (idea, aggregate)
    }

    #[test]
    fn orders_by_total_then_voters() {
        let ranked = rank_ideas(vec![
            scored("solar kiosk", 6.5, 4),
            scored("bike share", 8.2, 2),
            scored("food bank", 6.5, 9),
            scored("unvoted", 0.0, 0),
        ]);

        let titles: Vec<&str> = ranked.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["bike share", "food bank", "solar kiosk", "unvoted"]);
        assert_eq!(
            ranked.iter().map(|e| e.rank).collect::<Vec<_>>(),
            [1, 2, 3, 4]
        );
    }
}
