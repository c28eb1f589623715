//! Block and inline-level types.

use super::Grid;
use serde::{Deserialize, Serialize};

/// One structural unit of the converted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading (level 1 for `##`, level 2 for `###`)
    Heading {
        /// Heading level, 1 or 2
        level: u8,
        /// Heading text runs
        runs: Vec<InlineRun>,
    },

    /// A body paragraph
    Paragraph {
        /// Paragraph text runs
        runs: Vec<InlineRun>,
    },

    /// A bulleted list item
    BulletItem {
        /// Item text runs
        runs: Vec<InlineRun>,
    },

    /// A numbered list item
    NumberedItem {
        /// Item text runs
        runs: Vec<InlineRun>,
    },

    /// A table
    Table(Grid),

    /// Unrecognised content carried through untouched
    Raw {
        /// Literal source text
        text: String,
    },
}

impl Block {
    /// Create a heading block, clamping the level to 1..=2.
    pub fn heading(level: u8, runs: Vec<InlineRun>) -> Self {
        Block::Heading {
            level: level.clamp(1, 2),
            runs,
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(runs: Vec<InlineRun>) -> Self {
        Block::Paragraph { runs }
    }

    /// Create a bullet list item.
    pub fn bullet(runs: Vec<InlineRun>) -> Self {
        Block::BulletItem { runs }
    }

    /// Create a numbered list item.
    pub fn numbered(runs: Vec<InlineRun>) -> Self {
        Block::NumberedItem { runs }
    }

    /// Create a raw block.
    pub fn raw(text: impl Into<String>) -> Self {
        Block::Raw { text: text.into() }
    }

    /// Inline runs of this block, if it carries any.
    pub fn runs(&self) -> Option<&[InlineRun]> {
        match self {
            Block::Heading { runs, .. }
            | Block::Paragraph { runs }
            | Block::BulletItem { runs }
            | Block::NumberedItem { runs } => Some(runs),
            Block::Table(_) | Block::Raw { .. } => None,
        }
    }

    /// Visible text with all formatting removed.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Table(grid) => grid.plain_text(),
            Block::Raw { text } => text.clone(),
            _ => self
                .runs()
                .map(|runs| runs.iter().map(|r| r.text.as_str()).collect())
                .unwrap_or_default(),
        }
    }

    /// Check if this block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    /// Check if this block is a list item of either kind.
    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::BulletItem { .. } | Block::NumberedItem { .. })
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Check if this block is raw content.
    pub fn is_raw(&self) -> bool {
        matches!(self, Block::Raw { .. })
    }
}

/// Concatenate the visible text of a block sequence, one block per line.
pub fn plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.plain_text())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A contiguous span of text sharing the same emphasis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    /// The text content
    pub text: String,

    /// Bold emphasis
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,

    /// Italic emphasis
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl InlineRun {
    /// Create a plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, false, false)
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(text, true, false)
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(text, false, true)
    }

    /// Create a run with explicit flags.
    pub fn styled(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if any emphasis is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic
    }
}
