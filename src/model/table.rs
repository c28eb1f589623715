//! Table grid type.

use serde::{Deserialize, Serialize};

/// A rectangular table of string cells.
///
/// The first row is the header row. A grid always has at least one row and
/// one column, and every row has the same number of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr")]
pub struct Grid {
    /// Table name, when the source declared one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Rows of cells, header first
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Build a grid from raw rows, padding short rows with empty cells.
    ///
    /// Returns `None` when there is no row or no column at all.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return None;
        }

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Some(Self { name: None, rows })
    }

    /// Set the table name and return self.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// All rows, header first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row.
    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Rows after the header.
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }

    /// Get the number of rows (header included).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.rows[0].len()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Deserialize)]
struct GridRepr {
    #[serde(default)]
    name: Option<String>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = String;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let grid = Grid::from_rows(repr.rows).ok_or("table must have at least one cell")?;
        Ok(match repr.name {
            Some(name) => grid.with_name(name),
            None => grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_grid_pads_ragged_rows() {
        let grid = Grid::from_rows(vec![
            row(&["Item", "Qty", "Price"]),
            row(&["Design"]),
            row(&["Build", "2"]),
        ])
        .unwrap();

        assert_eq!(grid.column_count(), 3);
        assert!(grid.rows().iter().all(|r| r.len() == 3));
        assert_eq!(grid.body()[0], row(&["Design", "", ""]));
    }

    #[test]
    fn test_grid_never_truncates() {
        let grid = Grid::from_rows(vec![row(&["A"]), row(&["1", "2", "3"])]).unwrap();
        assert_eq!(grid.header(), row(&["A", "", ""]).as_slice());
        assert_eq!(grid.body()[0], row(&["1", "2", "3"]));
    }

    #[test]
    fn test_grid_rejects_empty() {
        assert!(Grid::from_rows(Vec::new()).is_none());
        assert!(Grid::from_rows(vec![Vec::new()]).is_none());
    }

    #[test]
    fn test_grid_name() {
        let grid = Grid::from_rows(vec![row(&["A"])]).unwrap().with_name("  ");
        assert_eq!(grid.name, None);

        let grid = grid.with_name("Budget");
        assert_eq!(grid.name.as_deref(), Some("Budget"));
        assert_eq!(grid.plain_text(), "A");
    }

    #[test]
    fn test_grid_deserialize_keeps_invariants() {
        let grid: Grid = serde_json::from_str(r#"{"rows":[["a","b"],["c"]]}"#).unwrap();
        assert_eq!(grid.body()[0], row(&["c", ""]));

        assert!(serde_json::from_str::<Grid>(r#"{"rows":[]}"#).is_err());
    }
}
