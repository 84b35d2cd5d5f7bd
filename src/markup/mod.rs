//! Inline markup scanning and format tree construction.

pub mod tokenizer;
pub mod tree;

pub use tokenizer::{segments, Segment, SegmentKind, TagKind};
pub use tree::build;
