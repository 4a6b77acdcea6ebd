// Table serializers: CSV, HTML-as-spreadsheet, native XLSX, JSON

pub mod csv;
pub mod grid;
pub mod html;
pub mod json;
pub mod xlsx;

pub use grid::TableGrid;
pub use xlsx::WorkbookWriter;
#[cfg(feature = "xlsx")]
pub use xlsx::XlsxWriter;
