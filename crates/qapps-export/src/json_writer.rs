use std::io::Write;

use serde_json::{Map, Value};

use crate::columns::ColumnSet;
use crate::error::ExportResult;
use crate::row::ExportRow;

/// One JSON object per row with keys in column order
pub fn row_object(columns: &ColumnSet, row: &ExportRow) -> Map<String, Value> {
    columns
        .iter()
        .map(|column| (column.name.to_string(), column.extract(row).to_json()))
        .collect()
}

/// Write rows as a pretty-printed JSON array. No rows produce `[]`.
pub fn write_json(
    writer: &mut dyn Write,
    columns: &ColumnSet,
    rows: &[ExportRow],
) -> ExportResult<()> {
    let records: Vec<Value> = rows
        .iter()
        .map(|row| Value::Object(row_object(columns, row)))
        .collect();

    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writer.write_all(b"\n")?;
    Ok(())
}
