use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that can occur between reading a page and saving an export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No tables found on the page")]
    NoTablesFound,

    #[error("Table index out of range: {index} (page has {count} tables)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Error extracting table data: {0}")]
    Extraction(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Not a failure for callers: the HTML spreadsheet path takes over.
    #[error("Native workbook generation unavailable")]
    SerializationUnavailable,

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not load page: {0}")]
    Source(String),
}

/// Broad classification used for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The requested table does not exist.
    NotFound,
    /// Malformed request or unsupported option.
    Input,
    /// Reading or serializing table content.
    Serialization,
    /// The save surface or page source failed.
    Host,
    /// Invalid or unreadable configuration.
    Config,
}

impl ExportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoTablesFound | Self::IndexOutOfRange { .. } => ErrorCategory::NotFound,
            Self::UnsupportedFormat(_) | Self::InvalidRequest(_) => ErrorCategory::Input,
            Self::Extraction(_) | Self::Serialization(_) | Self::SerializationUnavailable => {
                ErrorCategory::Serialization
            }
            Self::Save(_) | Self::Source(_) => ErrorCategory::Host,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Short text suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoTablesFound => "No tables found on this page.".into(),
            Self::IndexOutOfRange { .. } => "Could not process table data".into(),
            Self::Extraction(_) => "Could not read the table contents.".into(),
            Self::Serialization(_) => "Could not generate the export file.".into(),
            Self::SerializationUnavailable => "XLSX unavailable, exported as XLS.".into(),
            Self::Save(msg) => format!("Error exporting table: {msg}"),
            Self::UnsupportedFormat(fmt) => format!("Unsupported format: {fmt}"),
            Self::InvalidRequest(_) => "Invalid request.".into(),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Source(_) => "Error connecting to page. Please refresh and try again.".into(),
        }
    }

    /// True when the error only selects a fallback path.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::SerializationUnavailable)
    }
}
