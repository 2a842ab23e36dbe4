//! # plenum-search
//!
//! Similarity retrieval engine for plenum.
//!
//! Ranks a conversation's embedded chunks against a query by cosine
//! distance, with deterministic tie-breaking and multi-query expansion.

pub mod multi_query;
pub mod retrieval;
pub mod similarity;

pub use multi_query::{default_templates, reformulate, QUERY_PLACEHOLDER};
pub use retrieval::{RetrievalConfig, RetrievalEngine};
pub use similarity::{cosine_distance, cosine_similarity};
