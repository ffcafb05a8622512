//! CSV file parser

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::config::ReadOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Table};

use super::{ensure_exists, file_label, normalize_headers, Parser};

/// Parser for CSV files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, path: &Path, _options: &ReadOptions) -> Result<Table> {
        let mut chunks = CsvChunks::open(path, usize::MAX)?;
        let table = chunks.next_chunk()?.unwrap_or_else(|| chunks.empty_table());
        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    ensure_exists(path)?;
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_for(path))
        .from_reader(BufReader::new(file)))
}

/// Read only the header row of a CSV file
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(|e| Error::csv(path, e))?;
    if headers.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "CSV file is empty: {}",
            path.display()
        )));
    }
    Ok(normalize_headers(headers.iter().map(str::to_string)))
}

/// Reads a CSV file as a sequence of tables of at most `chunk_size` rows
pub struct CsvChunks {
    path: PathBuf,
    reader: csv::Reader<BufReader<File>>,
    columns: Vec<String>,
    chunk_size: usize,
    line: usize,
    done: bool,
}

impl CsvChunks {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        let columns = read_headers(path)?;
        let mut reader = open_reader(path)?;
        // Prime the header so records() starts at the first data row
        reader.headers().map_err(|e| Error::csv(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns,
            chunk_size,
            line: 1,
            done: false,
        })
    }

    /// Header names of the file
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn empty_table(&self) -> Table {
        let mut table = Table::new(self.columns.iter().map(Column::new).collect());
        table.source = Some(file_label(&self.path));
        table
    }

    /// Next chunk, or `None` once the file is exhausted
    pub fn next_chunk(&mut self) -> Result<Option<Table>> {
        if self.done {
            return Ok(None);
        }

        let mut table = self.empty_table();
        let mut record = csv::StringRecord::new();

        while table.row_count() < self.chunk_size {
            let more = self
                .reader
                .read_record(&mut record)
                .map_err(|e| Error::csv(&self.path, e))?;
            if !more {
                self.done = true;
                break;
            }
            self.line += 1;
            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            table.add_row(cells, self.line);
        }

        if table.row_count() == 0 && self.done && self.line > 1 {
            return Ok(None);
        }

        table.infer_column_types();
        Ok(Some(table))
    }
}

/// Parse a string value into a CellValue with type inference
pub(crate) fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    // Check for empty/null
    if trimmed.is_empty() || matches!(trimmed, "NA" | "N/A" | "NaN" | "null" | "NULL") {
        return CellValue::Null;
    }

    // Try parsing as boolean
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    // Try parsing as integer
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    // Try parsing as float; reject words like "inf" that Rust accepts
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
    }

    // Default to string, keeping the raw text
    CellValue::String(Cow::Owned(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;
    use std::io::Write;

    fn write_temp(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(ext).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Null);
        assert_eq!(parse_cell_value("NA"), CellValue::Null);
        assert_eq!(parse_cell_value("True"), CellValue::Bool(true));
        assert_eq!(parse_cell_value("false"), CellValue::Bool(false));
        assert_eq!(parse_cell_value("42"), CellValue::Int(42));
        assert_eq!(parse_cell_value(" 7 "), CellValue::Int(7));
        assert_eq!(parse_cell_value("3.14"), CellValue::Float(3.14));
        assert_eq!(parse_cell_value("inf"), CellValue::from("inf"));
        assert_eq!(parse_cell_value(" Alice "), CellValue::from(" Alice "));
    }

    #[test]
    fn test_parse_file() {
        let file = write_temp(".csv", "id,name,score\n1,Jo,1.5\n2,Bo\n");
        let table = CsvParser.parse(file.path(), &ReadOptions::default()).unwrap();

        assert_eq!(table.column_names(), vec!["id", "name", "score"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(1, "score"), Some(&CellValue::Null));
        assert_eq!(table.rows[1].source_line, 3);
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
        assert_eq!(table.columns[2].inferred_type, CellType::Float);
    }

    #[test]
    fn test_tsv_delimiter() {
        let file = write_temp(".tsv", "a\tb\nx\ty\n");
        let table = CsvParser.parse(file.path(), &ReadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.value(0, "b"), Some(&CellValue::from("y")));
    }

    #[test]
    fn test_header_only_file() {
        let file = write_temp(".csv", "id,name\n");
        let table = CsvParser.parse(file.path(), &ReadOptions::default()).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = write_temp(".csv", "");
        let err = CsvParser.parse(file.path(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_chunks() {
        let file = write_temp(".csv", "n\n1\n2\n3\n4\n5\n");
        let mut chunks = CsvChunks::open(file.path(), 2).unwrap();
        assert_eq!(chunks.columns().to_vec(), vec!["n"]);
        let mut sizes = Vec::new();
        while let Some(chunk) = chunks.next_chunk().unwrap() {
            sizes.push(chunk.row_count());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
