pub mod aggregate;
pub mod common;
pub mod criteria;
pub mod leaderboard;
pub mod scores;
pub mod voting_state;
