use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tablex_core::{CsvQuoting, ExportError, ExportFormat};
use tablex_docs::csv::{CSV_MIME, generate_csv};
use tablex_docs::html::{EXCEL_HTML_MIME, generate_excel_html};
use tablex_docs::json::{JSON_MIME, generate_json};
use tablex_docs::xlsx::{DEFAULT_SHEET_NAME, XLSX_MIME};
use tablex_docs::{TableGrid, WorkbookWriter};
use tablex_scan::ExtractedTable;
use tracing::{debug, info, warn};

use crate::save::{SaveOutcome, SaveTarget};

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#)
        .unwrap_or_else(|e| panic!("Bad file name pattern: {e}"))
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").unwrap_or_else(|e| panic!("Bad whitespace pattern: {e}")));

const MAX_STEM_CHARS: usize = 120;

/// A named blob ready for the save surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    /// An Excel export took the HTML table path instead of a native workbook.
    pub used_fallback: bool,
}

/// Exporter settings picked once at the composition root.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub csv_quoting: CsvQuoting,
    /// Pause between saves during export-all.
    pub stagger: Duration,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            csv_quoting: CsvQuoting::Always,
            stagger: Duration::from_millis(500),
        }
    }
}

/// One table that could not be exported during export-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExport {
    pub title: String,
    pub error: String,
}

/// Outcome of an export-all run.
#[derive(Debug, Default, Clone)]
pub struct ExportReport {
    pub saved: Vec<SaveOutcome>,
    pub failed: Vec<FailedExport>,
}

impl ExportReport {
    pub fn record_failure(&mut self, title: impl Into<String>, error: &ExportError) {
        self.failed.push(FailedExport {
            title: title.into(),
            error: error.to_string(),
        });
    }

    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

/// Turns grids into named files and hands them to a [`SaveTarget`].
pub struct Exporter {
    options: ExporterOptions,
    workbook: Option<Box<dyn WorkbookWriter>>,
}

impl Exporter {
    pub fn new(options: ExporterOptions) -> Self {
        Self {
            options,
            workbook: None,
        }
    }

    /// Inject the native workbook capability. Without one, Excel exports use
    /// the HTML table path.
    pub fn with_workbook_writer(mut self, writer: Box<dyn WorkbookWriter>) -> Self {
        self.workbook = Some(writer);
        self
    }

    pub fn has_native_workbook(&self) -> bool {
        self.workbook.is_some()
    }

    /// Serialize `grid` into a named artifact for `format`.
    pub fn render(
        &self,
        grid: &TableGrid,
        title: &str,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        if grid.is_empty() {
            return Err(ExportError::Extraction(
                "Invalid table data received".into(),
            ));
        }
        let stem = sanitize_file_stem(title);

        match format {
            ExportFormat::Csv => {
                let text = generate_csv(grid, self.options.csv_quoting)
                    .map_err(|e| ExportError::Serialization(format!("{e:#}")))?;
                Ok(ExportArtifact {
                    file_name: format!("{stem}.csv"),
                    mime_type: CSV_MIME,
                    bytes: text.into_bytes(),
                    used_fallback: false,
                })
            }
            ExportFormat::Excel => match self.native_workbook(grid) {
                Ok(bytes) => Ok(ExportArtifact {
                    file_name: format!("{stem}.xlsx"),
                    mime_type: XLSX_MIME,
                    bytes,
                    used_fallback: false,
                }),
                Err(e) => {
                    if e.is_fallback() {
                        debug!("No native workbook writer, using HTML table export");
                    } else {
                        warn!("Native workbook generation failed ({e}), falling back to HTML");
                    }
                    Ok(ExportArtifact {
                        file_name: format!("{stem}.xls"),
                        mime_type: EXCEL_HTML_MIME,
                        bytes: generate_excel_html(grid, title).into_bytes(),
                        used_fallback: true,
                    })
                }
            },
            ExportFormat::Json => {
                let text = generate_json(grid)
                    .map_err(|e| ExportError::Serialization(format!("{e:#}")))?;
                Ok(ExportArtifact {
                    file_name: format!("{stem}.json"),
                    mime_type: JSON_MIME,
                    bytes: text.into_bytes(),
                    used_fallback: false,
                })
            }
        }
    }

    fn native_workbook(&self, grid: &TableGrid) -> Result<Vec<u8>, ExportError> {
        let writer = self
            .workbook
            .as_ref()
            .ok_or(ExportError::SerializationUnavailable)?;
        debug!("Using {} for XLSX export", writer.name());
        writer
            .write_workbook(grid, DEFAULT_SHEET_NAME)
            .map_err(|e| ExportError::Serialization(format!("{e:#}")))
    }

    /// Render and save one table. Failures are logged and returned, never
    /// retried.
    pub async fn export(
        &self,
        grid: &TableGrid,
        title: &str,
        format: ExportFormat,
        target: &dyn SaveTarget,
    ) -> Result<(SaveOutcome, bool), ExportError> {
        info!("Exporting as {format}: {title}");
        let artifact = self.render(grid, title, format).inspect_err(|e| {
            warn!("Error in export process for {title}: {e}");
        })?;
        let used_fallback = artifact.used_fallback;
        let outcome = target.save(artifact).await.inspect_err(|e| {
            warn!("Download failed for {title}: {e}");
        })?;
        Ok((outcome, used_fallback))
    }

    /// Export every table in order, pausing `stagger` between saves.
    ///
    /// The pause only spaces out save prompts; it carries no correctness
    /// guarantee. A failing table does not stop the rest.
    pub async fn export_all(
        &self,
        tables: &[ExtractedTable],
        format: ExportFormat,
        target: &dyn SaveTarget,
    ) -> ExportReport {
        let mut report = ExportReport::default();

        for (idx, table) in tables.iter().enumerate() {
            if idx > 0 && !self.options.stagger.is_zero() {
                tokio::time::sleep(self.options.stagger).await;
            }
            match self.export(&table.data, &table.title, format, target).await {
                Ok((outcome, _)) => report.saved.push(outcome),
                Err(e) => report.record_failure(&table.title, &e),
            }
        }

        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "Export all finished"
        );
        report
    }
}

/// Make a title safe to use as a file name stem.
pub fn sanitize_file_stem(title: &str) -> String {
    // Tabs and newlines are whitespace first, control characters second.
    let collapsed = WHITESPACE_RUN.replace_all(title, " ");
    let replaced = UNSAFE_FILE_CHARS.replace_all(&collapsed, "_");
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();

    let stem: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let stem = stem.trim_end().to_string();
    if stem.is_empty() { "Table".to_string() } else { stem }
}
