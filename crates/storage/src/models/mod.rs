pub mod criterion;
pub mod idea;
pub mod idea_score;

pub use criterion::Criterion;
pub use idea::Idea;
pub use idea_score::IdeaScore;
