//! Writers for tables, workbooks and diff results

mod csv;
mod excel;
mod report;
mod terminal;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::AutoWidthConfig;
use crate::error::{Error, Result};
use crate::model::{Table, Workbook};
use crate::parser::is_workbook;

pub use self::csv::{write_csv, CsvAppender};
pub use self::excel::{
    column_widths, csvs_to_excel, safe_sheet_name, unique_sheet_name, write_workbook,
};
pub use self::report::{export_to_workbook, STATUS_COLORS};
pub use self::terminal::{write_summary, TerminalOutput};

/// Write `table` to `path`: a single-sheet workbook for Excel extensions, CSV otherwise
pub fn write_table(table: &Table, path: &Path, sheet_name: &str) -> Result<()> {
    if is_workbook(path) {
        let mut workbook = Workbook::new();
        workbook.insert(sheet_name, table.clone());
        write_workbook(&workbook, path, &AutoWidthConfig::default())
    } else {
        write_csv(table, path)
    }
}

/// Directory a destination lives in, created if missing
fn destination_dir(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    Ok(dir)
}

/// A temp file next to `path` that replaces it on `commit`
///
/// Dropping without committing removes the temp file and leaves `path` untouched.
pub(crate) struct PendingFile {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingFile {
    pub(crate) fn create(path: &Path) -> Result<Self> {
        let dir = destination_dir(path)?;
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self {
            target: path.to_path_buf(),
            tmp,
        })
    }

    pub(crate) fn file(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }

    pub(crate) fn commit(mut self) -> Result<()> {
        let target = self.target;
        self.tmp
            .as_file_mut()
            .flush()
            .and_then(|_| self.tmp.as_file().sync_all())
            .map_err(|e| Error::io(&target, e))?;
        self.tmp
            .persist(&target)
            .map_err(|e| Error::io(&target, e.error))?;
        Ok(())
    }
}

/// Write all of `bytes` to `path` through a temp file
pub(crate) fn persist_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut pending = PendingFile::create(path)?;
    pending
        .file()
        .write_all(bytes)
        .map_err(|e| Error::io(path, e))?;
    pending.commit()
}
