use crate::grid::TableGrid;

/// MIME type that makes spreadsheet applications open an HTML table as a
/// workbook.
pub const EXCEL_HTML_MIME: &str = "application/vnd.ms-excel";

/// Generate a spreadsheet-flavored HTML document holding a single table.
///
/// Saved with [`EXCEL_HTML_MIME`] and an `.xls` extension, Excel and
/// LibreOffice open it as a one-sheet workbook.
pub fn generate_excel_html(grid: &TableGrid, title: &str) -> String {
    format!(
        concat!(
            r#"<html xmlns:o="urn:schemas-microsoft-com:office:office" "#,
            r#"xmlns:x="urn:schemas-microsoft-com:office:excel">"#,
            r#"<head><meta http-equiv="content-type" content="application/vnd.ms-excel; charset=UTF-8">"#,
            r#"<meta charset="UTF-8"><title>{title}</title></head>"#,
            "<body>{table}</body></html>"
        ),
        title = escape_html(title),
        table = generate_html_table(grid),
    )
}

/// Generate a bare `<table>` whose rows and cells map 1:1 to the grid.
///
/// Cell content is HTML-escaped to prevent injection.
pub fn generate_html_table(grid: &TableGrid) -> String {
    let mut html = String::from("<table>");

    for row in grid.rows() {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_html_contains_exact_table() {
        let grid = TableGrid::from_rows([["Name", "Age"], ["Ann", "30"]]);
        let html = generate_excel_html(&grid, "People");
        assert!(html.contains(
            "<table><tr><td>Name</td><td>Age</td></tr><tr><td>Ann</td><td>30</td></tr></table>"
        ));
        assert!(html.starts_with("<html"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("urn:schemas-microsoft-com:office:excel"));
        assert!(html.contains("<title>People</title>"));
    }

    #[test]
    fn test_cells_are_escaped() {
        let grid = TableGrid::from_rows([["<b>bold</b>", "R&D", "\"q\""]]);
        let table = generate_html_table(&grid);
        assert!(table.contains("<td>&lt;b&gt;bold&lt;/b&gt;</td>"));
        assert!(table.contains("<td>R&amp;D</td>"));
        assert!(table.contains("<td>&quot;q&quot;</td>"));
        assert!(!table.contains("<b>bold</b>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = generate_excel_html(&TableGrid::default(), "<script>alert('x')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_grid_gives_empty_table() {
        assert_eq!(generate_html_table(&TableGrid::default()), "<table></table>");
    }

    #[test]
    fn test_ragged_rows_map_one_to_one() {
        let grid = TableGrid::from_rows([vec!["a", "b"], vec!["c"]]);
        assert_eq!(
            generate_html_table(&grid),
            "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>"
        );
    }
}
