//! Parsing of generated proposal text into blocks.

mod inline;
mod segmenter;
mod table;

pub use inline::parse_inline;
pub use segmenter::{segment, LineKind, Segmenter, SegmenterState};
pub use table::{extract, extract_descriptor, extract_pipe_table, Extraction};
