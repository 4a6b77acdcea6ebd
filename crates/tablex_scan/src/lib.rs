//! Table discovery and extraction over parsed HTML documents.
//!
//! A [`Page`] wraps a parsed document. [`detect_tables`] summarizes every
//! `<table>` for display, [`extract_table`] reads one table's cell text into a
//! [`TableGrid`](tablex_docs::TableGrid), and [`render_inline_controls`] builds
//! the per-table export controls when they are enabled.

pub mod detector;
pub mod extractor;
pub mod inline;
pub mod page;
pub mod text;

pub use detector::{PREVIEW_LIMIT, ScanOptions, TableSummary, detect_tables};
pub use extractor::{ExtractedTable, extract_table};
pub use inline::{InlineControl, render_inline_controls};
pub use page::Page;
