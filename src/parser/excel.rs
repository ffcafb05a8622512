//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate, Timelike};
use tracing::debug;

use crate::config::{ReadOptions, SheetSelector};
use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Table};

use super::{ensure_exists, file_label, normalize_headers, Parser};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, path: &Path, options: &ReadOptions) -> Result<Table> {
        let selector = options.sheet.clone().unwrap_or_default();
        read_sheet(path, &selector)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

/// Sheet names of a workbook, in workbook order
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    ensure_exists(path)?;
    let workbook = open_workbook_auto(path).map_err(|source| Error::Workbook {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(workbook.sheet_names())
}

/// Read one sheet of a workbook; the first row is the header
pub fn read_sheet(path: &Path, selector: &SheetSelector) -> Result<Table> {
    ensure_exists(path)?;
    let mut workbook = open_workbook_auto(path).map_err(|source| Error::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let names = workbook.sheet_names();
    let sheet_name = match selector {
        SheetSelector::Name(name) => names.iter().find(|n| *n == name).cloned(),
        SheetSelector::Index(index) => names.get(*index).cloned(),
    }
    .ok_or_else(|| Error::SheetNotFound {
        path: path.to_path_buf(),
        sheet: selector.to_string(),
    })?;

    debug!("Reading sheet '{}' from {}", sheet_name, path.display());

    let range: Range<Data> =
        workbook
            .worksheet_range(&sheet_name)
            .map_err(|source| Error::Workbook {
                path: path.to_path_buf(),
                source,
            })?;

    let mut table = parse_range(&range);
    table.source = Some(format!("{}[{}]", file_label(path), sheet_name));
    Ok(table)
}

fn parse_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    // First row is header; an empty sheet yields an empty table
    let Some(header_row) = rows.next() else {
        return Table::default();
    };

    let names = normalize_headers(header_row.iter().map(cell_to_string));
    let mut table = Table::new(names.into_iter().map(Column::new).collect());

    for (line_num, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    table.infer_column_types();
    table
}

fn cell_to_string(cell: &Data) -> String {
    match convert_cell(cell) {
        CellValue::Null => String::new(),
        other => other.display().into_owned(),
    }
}

/// Excel serial date (days since 1899-12-30) to an ISO string
fn excel_serial_to_string(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let dt = epoch.checked_add_signed(Duration::try_milliseconds(millis)?)?;
    if dt.num_seconds_from_midnight() == 0 {
        Some(dt.format("%Y-%m-%d").to_string())
    } else {
        Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_string(dt.as_f64()) {
            Some(s) => CellValue::String(Cow::Owned(s)),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::String(Cow::Owned(s.replacen('T', " ", 1))),
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(format!("#{:?}", e))),
    }
}
