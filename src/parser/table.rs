//! Table extraction from candidate text regions.
//!
//! Two notations are understood: a structured JSON descriptor
//! (`{"table": "...", "columns": [...], "rows": [[...]]}`) and a
//! pipe-delimited Markdown table. The descriptor is always tried first.
//! Extraction never fails hard; text that is not a table is handed back to
//! the segmenter for downgrading.

use serde::Deserialize;
use serde_json::Value;

use crate::model::Grid;

/// Outcome of a table extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The region is a well-formed table
    Grid(Grid),
    /// The region declares a table but its content is inconsistent
    Malformed,
    /// The region is not a table in any supported notation
    NotATable,
}

impl Extraction {
    /// The extracted grid, if any.
    pub fn into_grid(self) -> Option<Grid> {
        match self {
            Extraction::Grid(grid) => Some(grid),
            _ => None,
        }
    }
}

/// Try both notations on a candidate region, descriptor first.
pub fn extract(region: &str) -> Extraction {
    match extract_descriptor(region) {
        Extraction::NotATable => extract_pipe_table(region),
        found => found,
    }
}

#[derive(Debug, Deserialize)]
struct TableDescriptor {
    #[serde(default, alias = "name")]
    table: Option<String>,
    columns: Vec<Value>,
    rows: Vec<Vec<Value>>,
}

/// Parse a structured table descriptor.
///
/// Anything that is not a JSON object with `columns` and `rows` is
/// `NotATable`. A descriptor with no columns, or with rows whose length
/// differs from the column count, is `Malformed`.
pub fn extract_descriptor(region: &str) -> Extraction {
    let trimmed = region.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return Extraction::NotATable;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return Extraction::NotATable,
    };
    let declares_table = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("columns") && obj.contains_key("rows"));
    if !declares_table {
        return Extraction::NotATable;
    }

    let descriptor: TableDescriptor = match serde_json::from_value(value) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            log::debug!("table descriptor has the wrong shape: {}", e);
            return Extraction::Malformed;
        }
    };

    let width = descriptor.columns.len();
    if width == 0 {
        log::debug!("table descriptor declares no columns");
        return Extraction::Malformed;
    }
    if let Some(bad) = descriptor.rows.iter().position(|row| row.len() != width) {
        log::debug!(
            "table descriptor row {} has {} cells, expected {}",
            bad,
            descriptor.rows[bad].len(),
            width
        );
        return Extraction::Malformed;
    }

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(descriptor.rows.len() + 1);
    rows.push(descriptor.columns.iter().map(cell_text).collect());
    rows.extend(
        descriptor
            .rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect()),
    );

    match Grid::from_rows(rows) {
        Some(grid) => Extraction::Grid(match descriptor.table {
            Some(name) => grid.with_name(name),
            None => grid,
        }),
        None => Extraction::Malformed,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Parse a pipe-delimited table.
///
/// Needs at least two columns, a header row and one data row. Separator
/// rows (`---|:---:`) are dropped; ragged rows are padded to the widest row.
pub fn extract_pipe_table(region: &str) -> Extraction {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for line in region.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.contains('|') {
            return Extraction::NotATable;
        }
        let cells = split_pipe_row(line);
        if is_separator_row(&cells) {
            continue;
        }
        rows.push(cells);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.len() < 2 || width < 2 {
        return Extraction::NotATable;
    }

    match Grid::from_rows(rows) {
        Some(grid) => Extraction::Grid(grid),
        None => Extraction::NotATable,
    }
}

/// Split one table line into trimmed cells, ignoring one outer pipe on each
/// side.
pub(crate) fn split_pipe_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// A separator row has only cells made of dashes and colons, with at least
/// one dash somewhere.
pub(crate) fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| c.chars().all(|ch| ch == '-' || ch == ':'))
        && cells.iter().any(|c| c.contains('-'))
}
