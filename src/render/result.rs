//! Rendering result with statistics.

use serde::{Deserialize, Serialize};

use crate::model::Block;

/// A rendered `.docx` package.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Zip bytes of the document
    pub bytes: Vec<u8>,

    /// Statistics collected while rendering
    pub stats: RenderStats,
}

impl RenderedDocument {
    /// Size of the package in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the package is empty (never true for a rendered document).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Statistics collected during rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of headings rendered
    pub heading_count: u32,

    /// Number of body paragraphs rendered
    pub paragraph_count: u32,

    /// Number of bullet and numbered items rendered
    pub list_item_count: u32,

    /// Number of tables rendered
    pub table_count: u32,

    /// Number of raw blocks rendered as literal text
    pub raw_count: u32,

    /// Number of placeholders substituted across all parts
    pub placeholder_count: u32,

    /// Approximate word count of the inserted content
    pub word_count: u32,

    /// Number of deliverable and phase rows appended to template tables
    #[serde(default)]
    pub appended_row_count: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one block.
    pub fn add_block(&mut self, block: &Block) {
        match block {
            Block::Heading { .. } => self.heading_count += 1,
            Block::Paragraph { .. } => self.paragraph_count += 1,
            Block::BulletItem { .. } | Block::NumberedItem { .. } => self.list_item_count += 1,
            Block::Table(_) => self.table_count += 1,
            Block::Raw { .. } => self.raw_count += 1,
        }
        self.count_text(&block.plain_text());
    }

    /// Add word counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }

    /// Total number of blocks counted.
    pub fn block_count(&self) -> u32 {
        self.heading_count
            + self.paragraph_count
            + self.list_item_count
            + self.table_count
            + self.raw_count
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.heading_count += other.heading_count;
        self.paragraph_count += other.paragraph_count;
        self.list_item_count += other.list_item_count;
        self.table_count += other.table_count;
        self.raw_count += other.raw_count;
        self.placeholder_count += other.placeholder_count;
        self.word_count += other.word_count;
        self.appended_row_count += other.appended_row_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineRun;

    #[test]
    fn test_add_block() {
        let mut stats = RenderStats::new();
        stats.add_block(&Block::heading(1, vec![InlineRun::plain("Executive Summary")]));
        stats.add_block(&Block::bullet(vec![InlineRun::plain("one")]));
        stats.add_block(&Block::raw("<div>"));

        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.list_item_count, 1);
        assert_eq!(stats.raw_count, 1);
        assert_eq!(stats.word_count, 4);
        assert_eq!(stats.block_count(), 3);
    }

    #[test]
    fn test_merge() {
        let mut a = RenderStats {
            table_count: 1,
            ..Default::default()
        };
        let b = RenderStats {
            table_count: 2,
            placeholder_count: 3,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.table_count, 3);
        assert_eq!(a.placeholder_count, 3);
    }
}
