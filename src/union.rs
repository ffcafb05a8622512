//! Row concatenation with optional deduplication

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::config::{ReadOptions, SchemaPolicy, UnionOptions};
use crate::error::{Error, Result};
use crate::model::{Column, KeyBuilder, Row, RowKey, Table};
use crate::output::{write_table, CsvAppender};
use crate::parser::{file_label, is_workbook, read_headers, read_table, CsvChunks};

/// True when both lists hold the same names, in any order
pub(crate) fn same_column_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().collect::<FxHashSet<_>>() == b.iter().collect::<FxHashSet<_>>()
}

/// Every name in first-seen order
pub(crate) fn column_superset<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut all: Vec<String> = Vec::new();
    for list in lists {
        for name in list {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
    }
    all
}

/// Output layout for inputs with the given labels and columns
fn reconcile(inputs: &[(String, Vec<String>)], policy: SchemaPolicy) -> Result<Vec<String>> {
    let Some((_, reference)) = inputs.first() else {
        return Ok(Vec::new());
    };

    for (label, columns) in &inputs[1..] {
        if same_column_set(reference, columns) {
            continue;
        }
        match policy {
            SchemaPolicy::Strict => {
                return Err(Error::SchemaMismatch {
                    table: label.clone(),
                    expected: reference.clone(),
                    found: columns.clone(),
                })
            }
            SchemaPolicy::Lenient => {
                warn!("Different columns in {}: {:?}", label, columns);
            }
        }
    }

    Ok(column_superset(inputs.iter().map(|(_, c)| c.as_slice())))
}

/// Keeps the first row seen for each key
struct Deduper {
    keys: Option<KeyBuilder>,
    seen: FxHashSet<RowKey>,
}

impl Deduper {
    fn new(columns: &[String], options: &UnionOptions) -> Result<Self> {
        let keys = if options.dedupe {
            let layout = Table::new(columns.iter().map(Column::new).collect())
                .with_source("union result");
            Some(KeyBuilder::for_table(&layout, &options.dedupe_columns)?)
        } else {
            None
        };
        Ok(Self {
            keys,
            seen: FxHashSet::default(),
        })
    }

    /// False when the row repeats an earlier key
    fn admit(&mut self, row: &Row) -> bool {
        match &self.keys {
            Some(keys) => self.seen.insert(keys.row_key(row)),
            None => true,
        }
    }
}

/// Concatenate tables in input order
///
/// With `dedupe` only the first row per key survives; the key is the
/// dedupe columns, or every column when none are named.
pub fn union(tables: &[Table], options: &UnionOptions) -> Result<Table> {
    if tables.is_empty() {
        return Err(Error::InvalidArgument(
            "tables list cannot be empty".to_string(),
        ));
    }

    let inputs: Vec<(String, Vec<String>)> = tables
        .iter()
        .map(|t| (t.label().to_string(), t.column_names()))
        .collect();
    let columns = reconcile(&inputs, options.schema)?;
    let mut deduper = Deduper::new(&columns, options)?;

    let mut result = Table::new(columns.iter().map(Column::new).collect());
    let mut combined = 0;
    for table in tables {
        combined += table.row_count();
        for row in table.reindex(&columns).rows {
            if deduper.admit(&row) {
                result.rows.push(row);
            }
        }
    }
    result.infer_column_types();

    info!("Combined {} tables: {} total rows", tables.len(), combined);
    if options.dedupe {
        info!("Removed {} duplicate rows", combined - result.row_count());
    }
    Ok(result)
}

/// Union files into `output`, in memory or `chunk_size` records at a time
///
/// Returns the number of rows written.
pub fn union_files<P: AsRef<Path>>(
    files: &[P],
    output: &Path,
    options: &UnionOptions,
    chunk_size: Option<usize>,
) -> Result<usize> {
    if files.is_empty() {
        return Err(Error::InvalidArgument(
            "files list cannot be empty".to_string(),
        ));
    }

    info!("Unioning {} files -> {}", files.len(), output.display());

    match chunk_size {
        Some(size) => ChunkedUnion::new(files, options.clone())
            .with_chunk_size(size)
            .run(output),
        None => {
            let tables = files
                .iter()
                .map(|f| -> Result<Table> {
                    let path = f.as_ref();
                    Ok(read_table(path, &ReadOptions::default())?.with_source(file_label(path)))
                })
                .collect::<Result<Vec<_>>>()?;
            let result = union(&tables, options)?;
            write_table(&result, output, "Union")?;
            Ok(result.row_count())
        }
    }
}

/// Streaming union of CSV files
///
/// Only the headers are read up front; rows then flow through in chunks.
/// The key set is kept across chunks and files, so the output equals that
/// of the in-memory union.
pub struct ChunkedUnion {
    files: Vec<PathBuf>,
    options: UnionOptions,
    chunk_size: usize,
    cancel: Arc<AtomicBool>,
}

impl ChunkedUnion {
    pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

    pub fn new<P: AsRef<Path>>(files: &[P], options: UnionOptions) -> Self {
        Self {
            files: files.iter().map(|f| f.as_ref().to_path_buf()).collect(),
            options,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Share a flag that stops the run between chunks when set
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Write the union to `output` as CSV; the destination is untouched on failure
    pub fn run(&self, output: &Path) -> Result<usize> {
        if self.files.is_empty() {
            return Err(Error::InvalidArgument(
                "files list cannot be empty".to_string(),
            ));
        }
        if is_workbook(output) {
            return Err(Error::InvalidArgument(format!(
                "chunked union writes CSV only, got {}",
                output.display()
            )));
        }

        info!("Using chunked processing with chunksize={}", self.chunk_size);

        let inputs = self
            .files
            .iter()
            .map(|f| -> Result<(String, Vec<String>)> { Ok((file_label(f), read_headers(f)?)) })
            .collect::<Result<Vec<_>>>()?;
        let columns = reconcile(&inputs, self.options.schema)?;
        let mut deduper = Deduper::new(&columns, &self.options)?;
        let mut appender = CsvAppender::create(output, &columns)?;

        let mut read = 0;
        for (file_idx, file) in self.files.iter().enumerate() {
            info!(
                "Processing file {}/{}: {}",
                file_idx + 1,
                self.files.len(),
                file.display()
            );
            let mut chunks = CsvChunks::open(file, self.chunk_size)?;
            let mut chunk_idx = 0;

            while let Some(chunk) = chunks.next_chunk()? {
                if self.cancel.load(Ordering::Relaxed) {
                    warn!("Union cancelled after {} rows", read);
                    return Err(Error::Cancelled);
                }
                chunk_idx += 1;
                read += chunk.row_count();

                let rows: Vec<Row> = chunk
                    .reindex(&columns)
                    .rows
                    .into_iter()
                    .filter(|row| deduper.admit(row))
                    .collect();
                appender.append(&rows)?;
                debug!(
                    "  Processed chunk {} from {}: {} rows",
                    chunk_idx,
                    file_label(file),
                    chunk.row_count()
                );
            }
        }

        let written = appender.rows_written();
        appender.finish()?;
        info!("Wrote {} rows ({} read)", written, read);
        Ok(written)
    }
}
