//! Error types for csvexcel

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the readers, writers and engines
#[derive(Debug, Error)]
pub enum Error {
    /// An input path does not exist
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Reading or writing a file failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate
    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Workbook could not be opened or a sheet could not be read
    #[error("failed to read workbook '{}': {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Workbook could not be produced
    #[error("failed to write workbook '{}': {source}", path.display())]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// Requested sheet is not in the workbook
    #[error("sheet '{sheet}' not found in {}", path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    /// Tables being unioned have different column sets
    #[error("column mismatch in {table}: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A join, dedupe or diff key column is absent
    #[error("key column '{column}' not found in {table}")]
    KeyColumnNotFound { column: String, table: String },

    /// Strict sheet merge found differing columns
    #[error(
        "column mismatch in strict mode for sheet '{sheet}': {reference} has {expected:?}, {} has {found:?}",
        path.display()
    )]
    ColumnMismatch {
        sheet: String,
        reference: String,
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A diff key value occurs more than once on one side
    #[error("duplicate key {key} in {table}")]
    DuplicateKey { key: String, table: String },

    /// File extension not handled by any reader or writer
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Caller passed an unusable combination of arguments
    #[error("{0}")]
    InvalidArgument(String),

    /// Operation stopped through its cancel flag
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}
