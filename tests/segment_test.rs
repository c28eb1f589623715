//! Integration tests for text segmentation.

use propdocx::model::plain_text;
use propdocx::{segment, Block, Grid, InlineRun};
use regex::Regex;

fn runs(blocks: &[Block]) -> Vec<String> {
    blocks.iter().map(Block::plain_text).collect()
}

#[test]
fn test_typical_proposal_text() {
    let text = "\
## Executive Summary
ACME needs a **modern** portal.

## Methodology
### Phases
1. Discovery
2. Build
3. Launch

- Weekly demos
- _Shared_ backlog
";
    let blocks = segment(text);

    assert_eq!(blocks.len(), 9);
    assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
    assert_eq!(
        blocks[1],
        Block::paragraph(vec![
            InlineRun::plain("ACME needs a "),
            InlineRun::bold("modern"),
            InlineRun::plain(" portal."),
        ])
    );
    assert!(matches!(blocks[3], Block::Heading { level: 2, .. }));
    assert_eq!(blocks.iter().filter(|b| matches!(b, Block::NumberedItem { .. })).count(), 3);
    assert_eq!(blocks.iter().filter(|b| matches!(b, Block::BulletItem { .. })).count(), 2);
    assert_eq!(runs(&blocks[4..7]), vec!["Discovery", "Build", "Launch"]);
}

#[test]
fn test_descriptor_table() {
    let text = r#"## Budget
{"table": "Costs", "columns": ["Item", "Cost"], "rows": [["Design", 1000], ["Build", null]]}
Totals are indicative."#;
    let blocks = segment(text);

    assert_eq!(blocks.len(), 3);
    let expected = Grid::from_rows(vec![
        vec!["Item".into(), "Cost".into()],
        vec!["Design".into(), "1000".into()],
        vec!["Build".into(), String::new()],
    ])
    .unwrap()
    .with_name("Costs");
    assert_eq!(blocks[1], Block::Table(expected));
    assert_eq!(blocks[2].plain_text(), "Totals are indicative.");
}

#[test]
fn test_ragged_descriptor_is_raw() {
    let text = "```json\n{\"table\": \"T\", \"columns\": [\"A\", \"B\"], \"rows\": [[\"1\"]]}\n```\nAfter.";
    let blocks = segment(text);

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].is_raw());
    assert!(blocks[0].plain_text().starts_with("```json"));
    assert_eq!(blocks[1].plain_text(), "After.");
}

#[test]
fn test_pipe_table() {
    let text = "| Phase | Weeks |\n|---|---|\n| Build | 6 |\n| Launch | 2 |";
    let blocks = segment(text);

    assert_eq!(blocks.len(), 1);
    let Block::Table(grid) = &blocks[0] else {
        panic!("expected a table, got {:?}", blocks[0]);
    };
    assert_eq!(grid.header(), ["Phase", "Weeks"]);
    assert_eq!(grid.row_count(), 3);
}

#[test]
fn test_malformed_input_never_fails() {
    let text = "\
# Top level
```python
print(1)
```
> quote
<div>html</div>
{\"columns\": [\"A\"
**unclosed bold";
    let blocks = segment(text);

    assert!(!blocks.is_empty());
    assert!(blocks.iter().any(Block::is_raw));
    let last = blocks.last().unwrap();
    assert_eq!(last.plain_text(), "**unclosed bold");
}

#[test]
fn test_text_is_preserved() {
    let text = "## A\nfirst\n\n- one\n- two\n\nlast";
    let joined = runs(&segment(text)).join(" ");
    for word in ["A", "first", "one", "two", "last"] {
        assert!(joined.contains(word), "missing {word}");
    }
}

/// Letters and digits of `text`, with list markers removed.
fn content_chars(text: &str) -> Vec<char> {
    let marker = Regex::new(r"^\s*(\d+\.|[-*+])\s+").unwrap();
    text.lines()
        .flat_map(|line| {
            let line = marker.replace(line, "");
            line.chars().filter(|c| c.is_alphanumeric()).collect::<Vec<_>>()
        })
        .collect()
}

fn is_subsequence(needle: &[char], haystack: &[char]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|c| rest.any(|h| h == c))
}

#[test]
fn test_no_text_lost_on_fallback_paths() {
    let cases = [
        "Total | 100",
        "|---|---|\nx|y",
        "Cost | Qty\nDesign | 2\nnot a row\nBuild | 3",
        "```json\n{\"table\": \"T\", \"columns\": [\"A\", \"B\"], \"rows\": [[\"1\"], [\"2\", \"3\", \"4\"]]}\n```",
        "{\"table\": \"Broken\", \"columns\": [\"A\"",
        "before\n---\nafter",
        "<div class=\"note\">Important</div>",
        "- first item\n  continued here\n- second",
        "**unclosed bold and _open italic",
        "# Top heading\n#### Deep heading",
        "> quoted line\nplain",
        "1. one\n2. two\n10. ten",
        "Say ***this*** now",
    ];

    for input in cases {
        let blocks = segment(input);
        let output: Vec<char> = plain_text(&blocks)
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        assert!(
            is_subsequence(&content_chars(input), &output),
            "text lost for {input:?}: {blocks:?}"
        );
    }
}

#[test]
fn test_crlf_and_blank_input() {
    assert!(segment("").is_empty());
    assert!(segment("  \n\n\t\n").is_empty());

    let blocks = segment("## Title\r\n- item\r\n");
    assert_eq!(runs(&blocks), vec!["Title", "item"]);
}

#[test]
fn test_blocks_json_shape() {
    let json = propdocx::blocks_json("## A\n- b", propdocx::JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["type"], "heading");
    assert_eq!(value[1]["type"], "bullet_item");

    // A fenced response segments the same way the service sees it.
    let fenced = propdocx::blocks_json("```markdown\n## A\n- b\n```", propdocx::JsonFormat::Compact)
        .unwrap();
    assert_eq!(fenced, json);
}
