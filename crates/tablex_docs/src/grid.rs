use serde::{Deserialize, Serialize};

/// Text content of one table: rows of cell strings.
///
/// Rows may have different lengths; nothing pads or truncates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableGrid {
    rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from anything string-like, mostly for tests and samples.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<String>>> for TableGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_kept() {
        let grid = TableGrid::from_rows([vec!["a", "b", "c"], vec!["d"]]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.rows()[0].len(), 3);
        assert_eq!(grid.rows()[1], vec!["d".to_string()]);
    }

    #[test]
    fn test_empty_grid() {
        let grid = TableGrid::default();
        assert!(grid.is_empty());
        assert_eq!(grid.row_count(), 0);
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let grid = TableGrid::from_rows([["Name", "Age"], ["Ann", "30"]]);
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"[["Name","Age"],["Ann","30"]]"#);

        let back: TableGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }
}
