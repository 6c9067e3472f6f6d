use std::io::Write;

use crate::columns::ColumnSet;
use crate::error::ExportResult;
use crate::row::ExportRow;

/// Write rows as CSV. Fields are quoted only when they need it.
pub fn write_csv(
    writer: &mut dyn Write,
    columns: &ColumnSet,
    rows: &[ExportRow],
    include_headers: bool,
) -> ExportResult<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if include_headers {
        csv.write_record(columns.headers())?;
    }

    for row in rows {
        csv.write_record(columns.values(row).iter().map(|v| v.to_csv_field()))?;
    }

    csv.flush()?;
    Ok(())
}
