//! Crash-safe file writes
//!
//! Content goes to a temporary file in the destination directory and is
//! renamed into place only after it has been flushed and synced. A failed
//! write leaves no partial artifact under the final name.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ExportError, ExportResult};

const TEMP_PREFIX: &str = ".qapps-export-";
const TEMP_SUFFIX: &str = ".tmp";

/// Write `path` atomically using `write`.
///
/// The temporary file is removed when `write` fails.
pub fn write_atomic<F>(path: &Path, write: F) -> ExportResult<()>
where
    F: FnOnce(&mut dyn Write) -> ExportResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), "File written");
    Ok(())
}

/// Create the output directory and its parents
pub fn ensure_dir(path: &Path) -> ExportResult<()> {
    fs::create_dir_all(path).map_err(|source| ExportError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}
