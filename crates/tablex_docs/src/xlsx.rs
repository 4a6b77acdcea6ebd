use anyhow::Result;

use crate::grid::TableGrid;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sheet name used for single-table workbooks.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// A native spreadsheet generator.
///
/// Exporters hold an `Option` of one of these; when none is available Excel
/// exports fall back to the HTML table path.
pub trait WorkbookWriter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce the bytes of a one-sheet workbook holding `grid`.
    fn write_workbook(&self, grid: &TableGrid, sheet_name: &str) -> Result<Vec<u8>>;
}

#[cfg(feature = "xlsx")]
pub use native::XlsxWriter;

#[cfg(feature = "xlsx")]
mod native {
    use anyhow::{Context, Result};
    use rust_xlsxwriter::{Format, Workbook};

    use super::WorkbookWriter;
    use crate::grid::TableGrid;

    /// `rust_xlsxwriter`-backed workbook generator. The first row is
    /// written bold.
    #[derive(Debug, Clone, Default)]
    pub struct XlsxWriter {
        numeric_cells: bool,
    }

    impl XlsxWriter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Write cells that parse as finite numbers as numeric cells.
        pub fn with_numeric_cells(mut self, enabled: bool) -> Self {
            self.numeric_cells = enabled;
            self
        }

        fn numeric_value(&self, cell: &str) -> Option<f64> {
            if !self.numeric_cells {
                return None;
            }
            cell.trim().parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }

    impl WorkbookWriter for XlsxWriter {
        fn name(&self) -> &str {
            "rust_xlsxwriter"
        }

        fn write_workbook(&self, grid: &TableGrid, sheet_name: &str) -> Result<Vec<u8>> {
            let mut workbook = Workbook::new();
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet_name)
                .with_context(|| format!("Failed to set sheet name: {sheet_name}"))?;

            let header_format = Format::new().set_bold();

            for (row_idx, row) in grid.rows().iter().enumerate() {
                let excel_row = u32::try_from(row_idx)
                    .with_context(|| format!("Row {row_idx} exceeds worksheet limits"))?;
                for (col_idx, cell) in row.iter().enumerate() {
                    let excel_col = u16::try_from(col_idx)
                        .with_context(|| format!("Column {col_idx} exceeds worksheet limits"))?;

                    if let Some(num) = self.numeric_value(cell) {
                        worksheet
                            .write_number(excel_row, excel_col, num)
                            .with_context(|| {
                                format!("Failed to write number at ({excel_row}, {excel_col})")
                            })?;
                    } else if row_idx == 0 {
                        worksheet
                            .write_string_with_format(excel_row, excel_col, cell, &header_format)
                            .with_context(|| {
                                format!("Failed to write header at column {excel_col}")
                            })?;
                    } else {
                        worksheet
                            .write_string(excel_row, excel_col, cell)
                            .with_context(|| {
                                format!("Failed to write string at ({excel_row}, {excel_col})")
                            })?;
                    }
                }
            }

            // Auto-fit columns for readability
            worksheet.autofit();

            workbook
                .save_to_buffer()
                .context("Failed to save workbook to buffer")
        }
    }
}
