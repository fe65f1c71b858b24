// Query-time retrieval: ranking pipeline plus the orchestrating engine
pub mod engine;
pub mod ranking;

pub use engine::{RetrievalEngine, RetrievalParams};
pub use ranking::{rank_and_filter, Evidence, Match, MatchMetadata};
