//! Block segmentation of generated text.
//!
//! Lines are classified one at a time and fed through a small state machine
//! (`SegmenterState`) that tracks whether we are inside a bullet list, a
//! numbered list or a pipe table. List items are emitted one block per item;
//! grouping is implicit through adjacency.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::Block;

use super::inline::parse_inline;
use super::table::{extract_descriptor, extract_pipe_table, is_separator_row, split_pipe_row, Extraction};

/// Split generated text into an ordered sequence of blocks.
///
/// Never fails: anything that cannot be recognised is kept as a paragraph or
/// a raw block, so no input text is dropped.
pub fn segment(text: &str) -> Vec<Block> {
    Segmenter::new(text).run()
}

/// Where the segmenter is between two lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmenterState {
    /// Not inside any multi-line construct
    #[default]
    None,
    /// Inside a run of bullet items
    InBulletList,
    /// Inside a run of numbered items
    InNumberedList,
    /// Inside a run of pipe-table lines
    InTable,
}

impl SegmenterState {
    /// State after consuming a line of the given kind.
    pub fn next(self, kind: &LineKind<'_>) -> SegmenterState {
        match kind {
            LineKind::Bullet(_) => SegmenterState::InBulletList,
            LineKind::Numbered(_) => SegmenterState::InNumberedList,
            LineKind::TableRow => SegmenterState::InTable,
            LineKind::Blank
            | LineKind::Heading { .. }
            | LineKind::Unsupported
            | LineKind::Text(_) => SegmenterState::None,
        }
    }

    /// Whether a list item is open in this state.
    pub fn in_list(self) -> bool {
        matches!(
            self,
            SegmenterState::InBulletList | SegmenterState::InNumberedList
        )
    }
}

/// Classification of a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace-only
    Blank,
    /// `##` or `###` heading
    Heading {
        /// 1 for `##`, 2 for `###`
        level: u8,
        /// Text after the marker
        text: &'a str,
    },
    /// `- `, `* ` or `+ ` item
    Bullet(&'a str),
    /// `<n>. ` item
    Numbered(&'a str),
    /// A line containing `|`
    TableRow,
    /// Something block-like we do not support (tags, fences, rules, ...)
    Unsupported,
    /// Plain paragraph text
    Text(&'a str),
}

impl<'a> LineKind<'a> {
    /// Classify one line of generated text.
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }

        if trimmed.starts_with('#') {
            return classify_heading(trimmed);
        }

        // Separator rows such as `- | -` would otherwise pass for bullets or rules.
        if trimmed.contains('|') && is_separator_row(&split_pipe_row(trimmed)) {
            return LineKind::TableRow;
        }

        if is_horizontal_rule(trimmed) {
            return LineKind::Unsupported;
        }

        if let Some(text) = strip_bullet(trimmed) {
            return LineKind::Bullet(text);
        }

        if let Some(caps) = numbered_regex().captures(trimmed) {
            if let Some(text) = caps.get(1) {
                return LineKind::Numbered(text.as_str());
            }
        }

        if is_fence(trimmed) || is_block_quote(trimmed) || tag_regex().is_match(trimmed) {
            return LineKind::Unsupported;
        }

        if trimmed.contains('|') {
            return LineKind::TableRow;
        }

        LineKind::Text(trimmed)
    }
}

fn classify_heading(trimmed: &str) -> LineKind<'_> {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    let rest = &trimmed[hashes..];
    let separated = rest.is_empty() || rest.starts_with(char::is_whitespace);

    match hashes {
        2 | 3 if separated => LineKind::Heading {
            level: (hashes - 1) as u8,
            text: rest.trim(),
        },
        _ => LineKind::Unsupported,
    }
}

fn strip_bullet(trimmed: &str) -> Option<&str> {
    let mut chars = trimmed.chars();
    let marker = chars.next()?;
    let gap = chars.next()?;
    if matches!(marker, '-' | '*' | '+') && gap.is_whitespace() {
        Some(trimmed[1..].trim_start())
    } else {
        None
    }
}

fn is_horizontal_rule(trimmed: &str) -> bool {
    let marks: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3
        && matches!(marks[0], '-' | '*' | '_')
        && marks.iter().all(|&c| c == marks[0])
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn is_block_quote(trimmed: &str) -> bool {
    trimmed.starts_with('>')
}

fn numbered_regex() -> &'static Regex {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    NUMBERED.get_or_init(|| Regex::new(r"^\d{1,9}\.\s+(.*)$").expect("numbered pattern is valid"))
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(?:\s[^<>]*)?/?>").expect("tag pattern is valid")
    })
}

/// Line-driven segmenter.
pub struct Segmenter<'a> {
    lines: Vec<&'a str>,
    state: SegmenterState,
    blocks: Vec<Block>,
    /// Text of the list item still open (kind follows from `state`)
    item: Option<String>,
    /// Pipe-table lines collected so far
    table: Vec<&'a str>,
}

impl<'a> Segmenter<'a> {
    /// Create a segmenter over the given text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            state: SegmenterState::None,
            blocks: Vec::new(),
            item: None,
            table: Vec::new(),
        }
    }

    /// Consume all lines and return the blocks in document order.
    pub fn run(mut self) -> Vec<Block> {
        let mut i = 0;
        while i < self.lines.len() {
            if let Some(consumed) = self.try_descriptor(i) {
                i += consumed;
                continue;
            }

            let line = self.lines[i];
            self.step(line);
            i += 1;
        }

        self.flush();
        self.blocks
    }

    fn step(&mut self, line: &'a str) {
        let kind = LineKind::classify(line);

        // Indented plain text right after a list item continues that item.
        if self.state.in_list() && line.starts_with([' ', '\t']) {
            if let (LineKind::Text(text), Some(item)) = (&kind, self.item.as_mut()) {
                item.push(' ');
                item.push_str(text);
                return;
            }
        }

        if kind == LineKind::TableRow && self.state == SegmenterState::InTable {
            self.table.push(line);
            return;
        }

        self.flush();
        self.state = self.state.next(&kind);

        match kind {
            LineKind::Blank => {}
            LineKind::Heading { level, text } => {
                self.blocks.push(Block::heading(level, parse_inline(text)));
            }
            LineKind::Bullet(text) | LineKind::Numbered(text) => {
                self.item = Some(text.to_string());
            }
            LineKind::TableRow => self.table.push(line),
            LineKind::Unsupported => {
                log::debug!("keeping unsupported line as raw: {:?}", line);
                self.blocks.push(Block::raw(line));
            }
            LineKind::Text(text) => self.blocks.push(Block::paragraph(parse_inline(text))),
        }
    }

    /// Emit whatever multi-line construct is still open.
    fn flush(&mut self) {
        if let Some(text) = self.item.take() {
            let runs = parse_inline(&text);
            let block = match self.state {
                SegmenterState::InNumberedList => Block::numbered(runs),
                _ => Block::bullet(runs),
            };
            self.blocks.push(block);
        }

        if !self.table.is_empty() {
            let lines = std::mem::take(&mut self.table);
            match extract_pipe_table(&lines.join("\n")) {
                Extraction::Grid(grid) => self.blocks.push(Block::Table(grid)),
                _ => {
                    log::debug!("{} pipe line(s) did not form a table", lines.len());
                    for line in lines {
                        if is_separator_row(&split_pipe_row(line)) {
                            self.blocks.push(Block::raw(line));
                        } else {
                            self.blocks.push(Block::paragraph(parse_inline(line.trim())));
                        }
                    }
                }
            }
        }
    }

    /// Try to consume a structured table descriptor starting at `start`,
    /// optionally wrapped in a code fence. Returns the number of lines used.
    fn try_descriptor(&mut self, start: usize) -> Option<usize> {
        let first = self.lines[start].trim();
        let fenced = is_fence(first);
        let body_start = if fenced { start + 1 } else { start };

        if !self.lines.get(body_start)?.trim_start().starts_with('{') {
            return None;
        }
        let body_end = body_start + balanced_json_end(&self.lines[body_start..])?;

        let last = if fenced {
            let close = self.lines.get(body_end + 1)?.trim();
            if close != "```" && close != "~~~" {
                return None;
            }
            body_end + 1
        } else {
            body_end
        };

        let region = self.lines[body_start..=body_end].join("\n");
        let block = match extract_descriptor(&region) {
            Extraction::Grid(grid) => Block::Table(grid),
            Extraction::Malformed => {
                log::debug!("malformed table descriptor kept as raw text");
                Block::raw(self.lines[start..=last].join("\n"))
            }
            Extraction::NotATable => return None,
        };

        self.flush();
        self.state = SegmenterState::None;
        self.blocks.push(block);
        Some(last - start + 1)
    }
}

/// Index of the line on which the JSON object opened on the first line
/// closes. Gives up at a blank line or on unbalanced braces.
fn balanced_json_end(lines: &[&str]) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 && line.trim().is_empty() {
            return None;
        }
        for c in line.chars() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                }
                _ => {}
            }
        }
        if depth == 0 {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineRun;

    #[test]
    fn test_classify_lines() {
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
        assert_eq!(
            LineKind::classify("## Executive Summary"),
            LineKind::Heading {
                level: 1,
                text: "Executive Summary"
            }
        );
        assert_eq!(
            LineKind::classify("### Scope"),
            LineKind::Heading {
                level: 2,
                text: "Scope"
            }
        );
        assert_eq!(LineKind::classify("- Item A"), LineKind::Bullet("Item A"));
        assert_eq!(LineKind::classify("* Item B"), LineKind::Bullet("Item B"));
        assert_eq!(LineKind::classify("12. Twelfth"), LineKind::Numbered("Twelfth"));
        assert_eq!(LineKind::classify("a | b"), LineKind::TableRow);
        assert_eq!(LineKind::classify("Just text."), LineKind::Text("Just text."));
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(LineKind::classify("# Top level"), LineKind::Unsupported);
        assert_eq!(LineKind::classify("#### Too deep"), LineKind::Unsupported);
        assert_eq!(LineKind::classify("```rust"), LineKind::Unsupported);
        assert_eq!(LineKind::classify("> quoted"), LineKind::Unsupported);
        assert_eq!(LineKind::classify("---"), LineKind::Unsupported);
        assert_eq!(LineKind::classify("<div>hello</div>"), LineKind::Unsupported);
    }

    #[test]
    fn test_heading_beats_numbered() {
        assert_eq!(
            LineKind::classify("## 1. Title"),
            LineKind::Heading {
                level: 1,
                text: "1. Title"
            }
        );
    }

    #[test]
    fn test_state_transitions() {
        let s = SegmenterState::None;
        let s = s.next(&LineKind::Bullet("a"));
        assert_eq!(s, SegmenterState::InBulletList);
        assert_eq!(s.next(&LineKind::Bullet("b")), SegmenterState::InBulletList);
        assert_eq!(s.next(&LineKind::Numbered("1")), SegmenterState::InNumberedList);
        assert_eq!(s.next(&LineKind::TableRow), SegmenterState::InTable);
        assert_eq!(s.next(&LineKind::Blank), SegmenterState::None);
        assert!(SegmenterState::InNumberedList.in_list());
        assert!(!SegmenterState::InTable.in_list());
    }

    #[test]
    fn test_heading_block() {
        let blocks = segment("## Executive Summary");
        assert_eq!(
            blocks,
            vec![Block::heading(1, vec![InlineRun::plain("Executive Summary")])]
        );
    }

    #[test]
    fn test_empty_heading() {
        assert_eq!(segment("##"), vec![Block::heading(1, Vec::new())]);
    }

    #[test]
    fn test_empty_text() {
        assert!(segment("").is_empty());
        assert!(segment("\n\n  \n").is_empty());
    }

    #[test]
    fn test_bullets_are_individual_blocks() {
        let blocks = segment("- Item A\n- Item B");
        assert_eq!(
            blocks,
            vec![
                Block::bullet(vec![InlineRun::plain("Item A")]),
                Block::bullet(vec![InlineRun::plain("Item B")]),
            ]
        );
    }

    #[test]
    fn test_list_continuation() {
        let blocks = segment("1. First item\n   wraps here\n2. Second");
        assert_eq!(
            blocks,
            vec![
                Block::numbered(vec![InlineRun::plain("First item wraps here")]),
                Block::numbered(vec![InlineRun::plain("Second")]),
            ]
        );
    }

    #[test]
    fn test_unindented_text_ends_list() {
        let blocks = segment("- Item\nAfter the list");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_pipe_table_block() {
        let blocks = segment("Item | Qty\n---|---\nDesign | 1");
        assert_eq!(blocks.len(), 1);
        let Block::Table(grid) = &blocks[0] else {
            panic!("expected table, got {:?}", blocks[0]);
        };
        assert_eq!(grid.header(), ["Item".to_string(), "Qty".to_string()]);
        assert_eq!(grid.body(), [vec!["Design".to_string(), "1".to_string()]]);
    }

    #[test]
    fn test_dash_separator_is_not_a_bullet() {
        assert_eq!(LineKind::classify("- | -"), LineKind::TableRow);
        assert_eq!(LineKind::classify("--- | :---:"), LineKind::TableRow);
        assert_eq!(LineKind::classify("- a | b"), LineKind::Bullet("a | b"));

        let blocks = segment("Item | Qty\n- | -\nDesign | 1");
        assert_eq!(blocks.len(), 1);
        let Block::Table(grid) = &blocks[0] else {
            panic!("expected table, got {:?}", blocks[0]);
        };
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.body(), [vec!["Design".to_string(), "1".to_string()]]);
    }

    #[test]
    fn test_failed_pipe_table_degrades() {
        let blocks = segment("Options: A | B\n\nNext");
        assert_eq!(
            blocks,
            vec![
                Block::paragraph(vec![InlineRun::plain("Options: A | B")]),
                Block::paragraph(vec![InlineRun::plain("Next")]),
            ]
        );

        let blocks = segment("A | B\n---|---");
        assert_eq!(blocks[1], Block::raw("---|---"));
    }

    #[test]
    fn test_descriptor_block() {
        let text = "Intro\n{\"table\": \"Plan\", \"columns\": [\"Phase\", \"Weeks\"], \"rows\": [[\"Build\", 6]]}\nOutro";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 3);
        let Block::Table(grid) = &blocks[1] else {
            panic!("expected table");
        };
        assert_eq!(grid.name.as_deref(), Some("Plan"));
        assert_eq!(grid.body()[0], vec!["Build".to_string(), "6".to_string()]);
    }

    #[test]
    fn test_multiline_fenced_descriptor() {
        let text = "```json\n{\n  \"columns\": [\"A\", \"B\"],\n  \"rows\": [[\"1\", \"2\"]]\n}\n```";
        let blocks = segment(text);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_table());
    }

    #[test]
    fn test_malformed_descriptor_is_raw() {
        let line = r#"{"columns": ["A", "B"], "rows": [["only one"]]}"#;
        assert_eq!(segment(line), vec![Block::raw(line)]);
    }

    #[test]
    fn test_raw_keeps_literal_text() {
        let blocks = segment("<b>bold</b> text");
        assert_eq!(blocks, vec![Block::raw("<b>bold</b> text")]);
    }

    #[test]
    fn test_blank_lines_separate_lists() {
        let blocks = segment("- a\n\n- b\n\n1. c");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[2], Block::NumberedItem { .. }));
    }
}
