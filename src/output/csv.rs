//! CSV output

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Row, Table};

use super::PendingFile;

/// Write a table to a CSV file with a header row
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut appender = CsvAppender::create(path, &table.column_names())?;
    appender.append(&table.rows)?;
    let rows = appender.rows_written();
    appender.finish()?;
    info!("Wrote {} rows to {}", rows, path.display());
    Ok(())
}

/// Incremental CSV writer; the destination only appears on `finish`
pub struct CsvAppender {
    path: PathBuf,
    pending: PendingFile,
    writer: csv::Writer<BufWriter<File>>,
    rows: usize,
}

impl CsvAppender {
    pub fn create(path: &Path, headers: &[String]) -> Result<Self> {
        let mut pending = PendingFile::create(path)?;
        let handle = pending.file().try_clone().map_err(|e| Error::io(path, e))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(handle));
        writer
            .write_record(headers)
            .map_err(|e| Error::csv(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            pending,
            writer,
            rows: 0,
        })
    }

    pub fn append(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            self.writer
                .write_record(row.cells.iter().map(|c| c.display().into_owned()))
                .map_err(|e| Error::csv(&self.path, e))?;
        }
        self.rows += rows.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush and move the file into place
    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::io(&self.path, e))?;
        drop(self.writer);
        self.pending.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadOptions;
    use crate::model::CellValue;
    use crate::parser::read_table;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::from_rows(
            &["id", "name", "score", "ok"],
            vec![
                vec![CellValue::Int(1), "Jo, Jr.".into(), CellValue::Float(1.5), true.into()],
                vec![CellValue::Int(2), CellValue::Null, CellValue::Float(2.0), false.into()],
            ],
        );

        write_csv(&table, &path).unwrap();
        let back = read_table(&path, &ReadOptions::default()).unwrap();

        assert_eq!(back.column_names(), table.column_names());
        let cells: Vec<_> = back.rows.iter().map(|r| r.cells.clone()).collect();
        let expected: Vec<_> = table.rows.iter().map(|r| r.cells.clone()).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_appender_writes_nothing_until_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut appender = CsvAppender::create(&path, &["a".to_string()]).unwrap();
        appender
            .append(&[Row::new(vec![CellValue::Int(1)], 2)])
            .unwrap();
        assert!(!path.exists());
        appender.finish().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
