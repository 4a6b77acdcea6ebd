use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::{Page, preceding_heading, row_cells, table_caption, table_rows};
use crate::text::{flat_text, visible_text};

/// Preview grids are capped at this many rows and columns.
pub const PREVIEW_LIMIT: usize = 3;

/// Options the composition root passes into detection and rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Render per-table inline export controls.
    pub inline_buttons: bool,
}

/// Display metadata for one detected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Position among the page's tables.
    pub id: usize,
    pub rows: usize,
    /// Cell count of the first row.
    pub cols: usize,
    pub caption: String,
    pub title: String,
    pub preview: Vec<Vec<String>>,
}

/// Summarize every table on the page, in document order.
pub fn detect_tables(page: &Page, options: &ScanOptions) -> Vec<TableSummary> {
    let summaries: Vec<TableSummary> = page
        .tables()
        .into_iter()
        .enumerate()
        .map(|(id, table)| summarize(id, table))
        .collect();

    debug!(
        count = summaries.len(),
        inline_buttons = options.inline_buttons,
        "Detected tables"
    );
    summaries
}

fn summarize(id: usize, table: ElementRef<'_>) -> TableSummary {
    let rows = table_rows(table);
    let cols = rows.first().map(|r| row_cells(*r).len()).unwrap_or(0);
    let caption = caption_text(table);

    let preview = rows
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|row| {
            row_cells(*row)
                .into_iter()
                .take(PREVIEW_LIMIT.min(cols))
                .map(visible_text)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let title = resolve_title(heading_text(table), &caption)
        .unwrap_or_else(|| format!("Table {}", id + 1));

    TableSummary {
        id,
        rows: rows.len(),
        cols,
        caption,
        title,
        preview,
    }
}

/// Heading text wins over the caption; empty values fall through.
pub(crate) fn resolve_title(heading: Option<String>, caption: &str) -> Option<String> {
    heading
        .filter(|h| !h.is_empty())
        .or_else(|| (!caption.is_empty()).then(|| caption.to_string()))
}

pub(crate) fn heading_text(table: ElementRef<'_>) -> Option<String> {
    preceding_heading(table).map(flat_text)
}

pub(crate) fn caption_text(table: ElementRef<'_>) -> String {
    table_caption(table).map(flat_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(html: &str) -> Vec<TableSummary> {
        detect_tables(&Page::parse(html), &ScanOptions::default())
    }

    fn grid_table(rows: usize, cols: usize) -> String {
        let mut html = String::from("<table>");
        for r in 0..rows {
            html.push_str("<tr>");
            for c in 0..cols {
                html.push_str(&format!("<td>r{r}c{c}</td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        html
    }

    #[test]
    fn test_title_from_preceding_heading() {
        let tables = detect("<h2>Revenue</h2><table><tr><td>1</td></tr></table>");
        assert_eq!(tables[0].title, "Revenue");
    }

    #[test]
    fn test_heading_beats_caption() {
        let tables = detect(
            "<h4> Q3 </h4><table><caption>Totals</caption><tr><td>1</td></tr></table>",
        );
        assert_eq!(tables[0].title, "Q3");
        assert_eq!(tables[0].caption, "Totals");
    }

    #[test]
    fn test_title_from_caption() {
        let tables = detect("<p>x</p><table><caption>Totals</caption><tr><td>1</td></tr></table>");
        assert_eq!(tables[0].title, "Totals");
    }

    #[test]
    fn test_placeholder_title_is_one_based() {
        let tables = detect(
            "<h1>First</h1><table><tr><td>a</td></tr></table>\
             <div>gap</div><table><tr><td>b</td></tr></table>",
        );
        assert_eq!(tables[0].title, "First");
        assert_eq!(tables[1].title, "Table 2");
        assert_eq!(tables[1].id, 1);
    }

    #[test]
    fn test_empty_heading_falls_through() {
        let tables = detect("<h2>   </h2><table><caption>Totals</caption></table>");
        assert_eq!(tables[0].title, "Totals");
    }

    #[test]
    fn test_preview_is_capped_at_three_by_three() {
        let tables = detect(&grid_table(10, 10));
        let summary = &tables[0];
        assert_eq!(summary.rows, 10);
        assert_eq!(summary.cols, 10);
        assert_eq!(summary.preview.len(), 3);
        assert!(summary.preview.iter().all(|row| row.len() == 3));
        assert_eq!(summary.preview[2][2], "r2c2");
    }

    #[test]
    fn test_preview_smaller_at_edges() {
        let tables = detect(&grid_table(2, 2));
        assert_eq!(tables[0].preview, vec![vec!["r0c0", "r0c1"], vec!["r1c0", "r1c1"]]);
    }

    #[test]
    fn test_preview_bounded_by_first_row_width() {
        let tables = detect(
            "<table><tr><td>a</td></tr><tr><td>b</td><td>c</td><td>d</td></tr></table>",
        );
        assert_eq!(tables[0].cols, 1);
        assert_eq!(tables[0].preview, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_rows_without_cells_dropped_from_preview() {
        let tables = detect("<table><tr></tr><tr><td>x</td></tr></table>");
        assert_eq!(tables[0].rows, 2);
        assert_eq!(tables[0].cols, 0);
        assert!(tables[0].preview.is_empty());
    }

    #[test]
    fn test_no_tables() {
        assert!(detect("<p>nothing here</p>").is_empty());
    }

    #[test]
    fn test_empty_table() {
        let tables = detect("<table></table>");
        assert_eq!(tables[0].rows, 0);
        assert_eq!(tables[0].cols, 0);
        assert_eq!(tables[0].title, "Table 1");
    }

    #[test]
    fn test_summary_serializes_for_messages() {
        let tables = detect("<table><tr><td>1</td></tr></table>");
        let json = serde_json::to_value(&tables[0]).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["rows"], 1);
        assert_eq!(json["title"], "Table 1");
        assert_eq!(json["preview"][0][0], "1");
    }
}
