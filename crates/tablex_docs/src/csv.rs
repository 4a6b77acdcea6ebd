use anyhow::{Context, Result};
use tablex_core::CsvQuoting;

use crate::grid::TableGrid;

pub const CSV_MIME: &str = "text/csv";

/// Serialize a grid as CSV: cells joined by commas, rows by `\n`, no
/// trailing newline.
///
/// Escaping is done by the `csv` crate; `quoting` decides which cells are
/// wrapped in quotes. Ragged rows are written as-is.
pub fn generate_csv(grid: &TableGrid, quoting: CsvQuoting) -> Result<String> {
    let style = match quoting {
        CsvQuoting::Always => csv::QuoteStyle::Always,
        CsvQuoting::IfNeeded => csv::QuoteStyle::Necessary,
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(style)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for (idx, row) in grid.rows().iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write CSV row {idx}"))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    let mut text = String::from_utf8(bytes).context("CSV output contained invalid UTF-8")?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Parse CSV text back into a grid. No header row is assumed and records
/// may differ in length.
pub fn parse_csv(input: &str) -> Result<TableGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut grid = TableGrid::default();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        grid.push_row(record.iter().map(String::from).collect());
    }

    Ok(grid)
}
