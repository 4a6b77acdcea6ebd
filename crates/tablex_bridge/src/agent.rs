use tablex_scan::{
    ExtractedTable, Page, ScanOptions, TableSummary, detect_tables, extract_table,
    render_inline_controls,
};
use tracing::{debug, error};

use crate::message::{ProcessedTable, Request, Response};

/// Answers page-side requests against one parsed document.
///
/// The page is parsed once and kept; requests never mutate it. The scan
/// options are owned by whoever holds the preference store and are only
/// replaced through [`ContentAgent::set_options`].
pub struct ContentAgent {
    page: Page,
    options: ScanOptions,
}

impl ContentAgent {
    pub fn new(page: Page, options: ScanOptions) -> Self {
        Self { page, options }
    }

    pub fn from_html(html: &str, options: ScanOptions) -> Self {
        Self::new(Page::parse(html), options)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ScanOptions) {
        self.options = options;
    }

    pub fn detect(&self) -> Vec<TableSummary> {
        detect_tables(&self.page, &self.options)
    }

    pub fn extract(&self, index: usize) -> Result<ExtractedTable, tablex_core::ExportError> {
        extract_table(&self.page, index)
    }

    /// Extract every table, skipping (and logging) any that cannot be read.
    pub fn extract_all(&self) -> Vec<ExtractedTable> {
        (0..self.page.table_count())
            .filter_map(|index| match self.extract(index) {
                Ok(table) => Some(table),
                Err(e) => {
                    error!(index, "Skipping table: {e}");
                    None
                }
            })
            .collect()
    }

    /// Handle a content-side request. Returns `None` for actions this side
    /// does not own.
    pub fn handle(&self, request: &Request) -> Option<Response> {
        match request {
            Request::DetectTables => {
                let tables = self.detect();
                let inline_controls = render_inline_controls(&tables, &self.options);
                debug!(count = tables.len(), "Detected tables");
                Some(Response::Tables {
                    tables,
                    inline_controls,
                })
            }
            Request::ProcessTable { index, format } => {
                let result = match self.extract(*index) {
                    Ok(table) => Some(ProcessedTable {
                        data: table.data,
                        title: table.title,
                        format: *format,
                    }),
                    Err(e) => {
                        error!("Error extracting table data: {e}");
                        None
                    }
                };
                Some(Response::Processed { result })
            }
            Request::ToggleInlineButtons { .. } | Request::ExportTable { .. } => None,
        }
    }
}
