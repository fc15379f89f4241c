pub mod admin;
pub mod criteria;
pub mod ideas;
pub mod leaderboard;
