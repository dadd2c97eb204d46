pub mod ranker;

pub use ranker::{normalize, rank, MatchRank};
