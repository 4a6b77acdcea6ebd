use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::grid::TableGrid;

pub const JSON_MIME: &str = "application/json";

/// Serialize a grid as pretty-printed JSON.
///
/// With a header row and at least one data row, each data row becomes an
/// object keyed by the header cells, in column order; a row shorter than the
/// header only carries the keys it has. Otherwise the raw grid is written as
/// an array of arrays.
pub fn generate_json(grid: &TableGrid) -> Result<String> {
    let value = match grid.rows().split_first() {
        Some((headers, body)) if !body.is_empty() => Value::Array(
            body.iter()
                .map(|row| {
                    let object: Map<String, Value> = headers
                        .iter()
                        .zip(row.iter())
                        .map(|(key, cell)| (key.clone(), Value::String(cell.clone())))
                        .collect();
                    Value::Object(object)
                })
                .collect(),
        ),
        _ => serde_json::to_value(grid).context("Failed to convert grid to JSON")?,
    };

    serde_json::to_string_pretty(&value).context("Failed to serialize JSON")
}
