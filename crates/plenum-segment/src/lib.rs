//! # plenum-segment
//!
//! Semantic document segmentation for plenum.
//!
//! Splits raw document text into ordered, retrievable chunks carrying
//! structural metadata (section titles, paragraph ids, semantic-group
//! labels, importance scores), independent of embedding generation.

pub mod labels;
pub mod segmenter;
pub mod sentence;

pub use segmenter::{Segment, Segmenter, SegmenterConfig};
pub use sentence::{split_sentences, SentenceSpan};
