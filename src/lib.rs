//! csvexcel - combine, join, merge and compare CSV and Excel files
//!
//! Files are loaded into [`Table`]s, transformed by one of the engines
//! ([`union`], [`join`], [`merge`], [`diff`]) and written back as CSV or
//! workbooks.

pub mod config;
pub mod diff;
pub mod error;
pub mod join;
pub mod logging;
pub mod merge;
pub mod model;
pub mod output;
pub mod parser;
pub mod union;

pub use config::{
    DiffConfig, ExportOptions, JoinMode, MergeMode, ReadOptions, SchemaPolicy, SheetScope,
    SheetSelector, UnionOptions,
};
pub use diff::{DiffResult, DiffStats, RowStatus};
pub use error::{Error, Result};
pub use model::{CellValue, Table, Workbook};
