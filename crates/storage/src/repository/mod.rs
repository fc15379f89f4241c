pub mod criteria;
pub mod ideas;
pub mod scores;
