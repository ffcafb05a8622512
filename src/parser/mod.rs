//! Parser layer for reading delimited text and workbooks

mod csv;
mod excel;

use std::path::Path;

use tracing::info;

use crate::config::ReadOptions;
use crate::error::{Error, Result};
use crate::model::Table;

pub use self::csv::{read_headers, CsvChunks, CsvParser};
pub use self::excel::{read_sheet, sheet_names, ExcelParser};

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file path
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = extension(path);

        self.parsers
            .iter()
            .find(|parser| parser.supports_extension(&ext))
            .map(|parser| parser.as_ref())
            .ok_or_else(|| {
                Error::UnsupportedFormat(if ext.is_empty() {
                    format!("no extension on {}", path.display())
                } else {
                    ext
                })
            })
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        ensure_exists(path)?;
        let parser = self.get_parser(path)?;
        let mut table = parser.parse(path, options)?;
        if let Some(max_rows) = options.max_rows {
            if table.row_count() > max_rows {
                tracing::warn!(
                    "Truncating {} from {} to {} rows",
                    path.display(),
                    table.row_count(),
                    max_rows
                );
                table.truncate(max_rows);
            }
        }
        info!("Loaded {} rows from {}", table.row_count(), path.display());
        Ok(table)
    }
}

/// Load a CSV or workbook file into a table
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    ParserFactory::new().parse(path, options)
}

/// Fail with `FileNotFound` when the path does not exist
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// True for extensions handled by the workbook reader
pub fn is_workbook(path: &Path) -> bool {
    ExcelParser.supports_extension(&extension(path))
}

/// Short name of a file for table labels and sheet names
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Make repeated or blank header names unique: `a, a, ""` becomes `a, a.1, Column3`
pub(crate) fn normalize_headers<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = rustc_hash::FxHashMap::<String, usize>::default();
    let mut out: Vec<String> = Vec::new();
    for (i, name) in names.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Column{}", i + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        while out.contains(&candidate) {
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            candidate = format!("{}.{}", base, n);
        }
        out.push(candidate);
    }
    out
}
