use serde::{Deserialize, Serialize};
use tablex_core::ExportError;
use tablex_docs::TableGrid;
use tracing::{debug, error};

use crate::detector::{caption_text, heading_text, resolve_title};
use crate::page::{Page, row_cells, table_rows};
use crate::text::visible_text;

/// Cell text of one table plus the title used to name its export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub data: TableGrid,
    pub title: String,
}

/// Read the trimmed visible text of every cell of table `index`.
///
/// Rows keep whatever cell count they have. The fallback title is
/// `Table_N` (1-based) so it can be used directly as a file name.
pub fn extract_table(page: &Page, index: usize) -> Result<ExtractedTable, ExportError> {
    let tables = page.tables();

    if tables.is_empty() {
        error!("No tables found on the page");
        return Err(ExportError::NoTablesFound);
    }

    let Some(table) = tables.get(index).copied() else {
        error!(index, count = tables.len(), "Table index out of range");
        return Err(ExportError::IndexOutOfRange {
            index,
            count: tables.len(),
        });
    };

    let data = TableGrid::new(
        table_rows(table)
            .into_iter()
            .map(|row| row_cells(row).into_iter().map(visible_text).collect())
            .collect(),
    );

    let title = resolve_title(heading_text(table), &caption_text(table))
        .unwrap_or_else(|| format!("Table_{}", index + 1));

    debug!(index, rows = data.row_count(), %title, "Extracted table");
    Ok(ExtractedTable { data, title })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\
        <h2>People</h2>\
        <table>\
          <thead><tr><th> Name </th><th>Age</th></tr></thead>\
          <tbody><tr><td>Ann</td><td>30</td></tr><tr><td>Bob</td></tr></tbody>\
        </table>\
        <table><tr><td>x</td></tr></table>";

    #[test]
    fn test_extracts_trimmed_cells() {
        let table = extract_table(&Page::parse(PAGE), 0).unwrap();
        assert_eq!(table.title, "People");
        assert_eq!(
            table.data,
            TableGrid::from_rows([vec!["Name", "Age"], vec!["Ann", "30"], vec!["Bob"]])
        );
    }

    #[test]
    fn test_ragged_rows_not_padded() {
        let table = extract_table(&Page::parse(PAGE), 0).unwrap();
        assert_eq!(table.data.rows()[2].len(), 1);
    }

    #[test]
    fn test_fallback_title_uses_underscore() {
        let table = extract_table(&Page::parse(PAGE), 1).unwrap();
        assert_eq!(table.title, "Table_2");
    }

    #[test]
    fn test_index_out_of_range() {
        let err = extract_table(&Page::parse(PAGE), 5).unwrap_err();
        assert!(matches!(
            err,
            ExportError::IndexOutOfRange { index: 5, count: 2 }
        ));
    }

    #[test]
    fn test_no_tables() {
        let err = extract_table(&Page::parse("<p>none</p>"), 0).unwrap_err();
        assert!(matches!(err, ExportError::NoTablesFound));
    }

    #[test]
    fn test_caption_title() {
        let page = Page::parse("<table><caption> Totals </caption><tr><td>1</td></tr></table>");
        assert_eq!(extract_table(&page, 0).unwrap().title, "Totals");
    }
}
