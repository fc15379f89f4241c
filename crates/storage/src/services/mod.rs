pub mod aggregation;
pub mod change_feed;
pub mod criteria_registry;
pub mod leaderboard;
pub mod score_cache;
pub mod score_ledger;
pub mod voting;
pub mod voting_state;
