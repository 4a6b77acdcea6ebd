use serde::{Deserialize, Serialize};
use tablex_core::ExportFormat;
use tablex_docs::html::escape_html;

use crate::detector::{ScanOptions, TableSummary};

/// Rendered export controls for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineControl {
    pub table_id: usize,
    pub html: String,
}

/// Build the inline export controls shown next to each table.
///
/// Returns nothing unless `options.inline_buttons` is set.
pub fn render_inline_controls(
    summaries: &[TableSummary],
    options: &ScanOptions,
) -> Vec<InlineControl> {
    if !options.inline_buttons {
        return Vec::new();
    }

    summaries
        .iter()
        .map(|summary| InlineControl {
            table_id: summary.id,
            html: render_control(summary),
        })
        .collect()
}

fn render_control(summary: &TableSummary) -> String {
    let mut html = format!(
        r#"<div class="tablex-inline" data-table-index="{id}"><span class="tablex-inline-title">{title}</span>"#,
        id = summary.id,
        title = escape_html(&summary.title),
    );
    for (format, label) in [(ExportFormat::Csv, "CSV"), (ExportFormat::Excel, "Excel")] {
        html.push_str(&format!(
            r#"<button type="button" data-format="{format}">{label}</button>"#
        ));
    }
    html.push_str("</div>");
    html
}
