//! Workbook output with column auto-sizing

use std::path::Path;

use rust_xlsxwriter::{Format, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::config::{AutoWidthConfig, ReadOptions};
use crate::error::{Error, Result};
use crate::model::{CellValue, Table, Workbook};
use crate::parser::{file_label, CsvParser, Parser};

use super::persist_bytes;

const MAX_SHEET_NAME: usize = 31;

/// Make `name` a legal sheet name: no `/ \ ? * [ ] :`, at most 31 chars, never empty
pub fn safe_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '*' | '[' | ']' | ':' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();

    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Sanitised name that does not collide (case-insensitively) with `taken`
pub fn unique_sheet_name(name: &str, taken: &[String]) -> String {
    let base = safe_sheet_name(name);
    let clashes = |candidate: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(candidate));
    if !clashes(&base) {
        return base;
    }

    let mut n = 2;
    loop {
        let suffix = format!(" ({})", n);
        let stem: String = base
            .chars()
            .take(MAX_SHEET_NAME - suffix.chars().count())
            .collect();
        let candidate = format!("{}{}", stem, suffix);
        if !clashes(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Width per column: the longer of the weighted header and the longest cell, plus padding, clamped
pub fn column_widths(table: &Table, config: &AutoWidthConfig) -> Vec<f64> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let header = (column.name.chars().count() as f64 * config.header_factor).floor();
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.display().chars().count())
                .max()
                .unwrap_or(0) as f64;

            (header.max(longest) + config.padding).clamp(config.min_width, config.max_width)
        })
        .collect()
}

pub(crate) fn xlsx_error(path: &Path, source: XlsxError) -> Error {
    Error::Xlsx {
        path: path.to_path_buf(),
        source,
    }
}

/// Write one cell; missing cells are left blank unless a format must show
pub(crate) fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> std::result::Result<(), XlsxError> {
    match (value, format) {
        (CellValue::Null, None) => {}
        (CellValue::Null, Some(fmt)) => {
            worksheet.write_blank(row, col, fmt)?;
        }
        (CellValue::Bool(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (CellValue::Bool(b), Some(fmt)) => {
            worksheet.write_boolean_with_format(row, col, *b, fmt)?;
        }
        (CellValue::Int(_) | CellValue::Float(_), fmt) => {
            let number = value.as_f64().unwrap_or_default();
            match fmt {
                Some(fmt) => worksheet.write_number_with_format(row, col, number, fmt)?,
                None => worksheet.write_number(row, col, number)?,
            };
        }
        (CellValue::String(s), None) => {
            worksheet.write_string(row, col, &**s)?;
        }
        (CellValue::String(s), Some(fmt)) => {
            worksheet.write_string_with_format(row, col, &**s, fmt)?;
        }
    }
    Ok(())
}

/// Write a table with a bold header row starting at A1
pub(crate) fn write_sheet(
    worksheet: &mut Worksheet,
    table: &Table,
    auto_width: &AutoWidthConfig,
) -> std::result::Result<(), XlsxError> {
    let header = Format::new().set_bold();
    for (col, column) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, column.name.as_str(), &header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.cells.iter().enumerate() {
            write_cell(worksheet, row_idx as u32 + 1, col as u16, value, None)?;
        }
    }

    apply_widths(worksheet, table, auto_width)
}

pub(crate) fn apply_widths(
    worksheet: &mut Worksheet,
    table: &Table,
    auto_width: &AutoWidthConfig,
) -> std::result::Result<(), XlsxError> {
    if auto_width.enabled {
        for (col, width) in column_widths(table, auto_width).into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width)?;
        }
    }
    Ok(())
}

/// Write every sheet of `workbook` to `path`
pub fn write_workbook(
    workbook: &Workbook,
    path: &Path,
    auto_width: &AutoWidthConfig,
) -> Result<()> {
    if workbook.is_empty() {
        return Err(Error::InvalidArgument(
            "cannot write a workbook without sheets".to_string(),
        ));
    }

    let mut book = rust_xlsxwriter::Workbook::new();
    let mut taken: Vec<String> = Vec::new();

    for (name, table) in &workbook.sheets {
        let sheet_name = unique_sheet_name(name, &taken);
        let worksheet = book.add_worksheet();
        worksheet
            .set_name(sheet_name.as_str())
            .map_err(|e| xlsx_error(path, e))?;
        write_sheet(worksheet, table, auto_width).map_err(|e| xlsx_error(path, e))?;
        debug!("  Wrote sheet '{}' with {} rows", sheet_name, table.row_count());
        taken.push(sheet_name);
    }

    let bytes = book.save_to_buffer().map_err(|e| xlsx_error(path, e))?;
    persist_bytes(path, &bytes)?;
    info!("Wrote {} sheets to {}", workbook.len(), path.display());
    Ok(())
}

/// Combine CSV files into one workbook, one sheet per file
///
/// Sheet names default to the file stems.
pub fn csvs_to_excel<P: AsRef<Path>>(
    files: &[P],
    output: &Path,
    sheet_names: Option<&[String]>,
) -> Result<()> {
    if files.is_empty() {
        return Err(Error::InvalidArgument("csv file list cannot be empty".to_string()));
    }
    if let Some(names) = sheet_names {
        if names.len() != files.len() {
            return Err(Error::InvalidArgument(format!(
                "number of sheet names ({}) must match number of CSV files ({})",
                names.len(),
                files.len()
            )));
        }
    }

    info!("Converting {} CSV files to Excel: {}", files.len(), output.display());

    let mut workbook = Workbook::new();
    for (i, file) in files.iter().enumerate() {
        let file: &Path = file.as_ref();
        let table = CsvParser.parse(file, &ReadOptions::default())?;
        let requested = match sheet_names {
            Some(names) => names[i].clone(),
            None => file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_label(file)),
        };
        let taken: Vec<String> = workbook.sheet_names().into_iter().map(str::to_string).collect();
        let name = unique_sheet_name(&requested, &taken);
        info!("  Added sheet '{}' with {} rows", name, table.row_count());
        workbook.insert(name, table);
    }

    write_workbook(&workbook, output, &AutoWidthConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetSelector;
    use crate::parser::{read_sheet, sheet_names};

    #[test]
    fn test_safe_sheet_name() {
        assert_eq!(safe_sheet_name("a/b[c]"), "a_b_c_");
        assert_eq!(safe_sheet_name(""), "Sheet1");
        assert_eq!(safe_sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_unique_sheet_name() {
        let taken = vec!["Data".to_string()];
        assert_eq!(unique_sheet_name("data", &taken), "data (2)");
        assert_eq!(unique_sheet_name("Other", &taken), "Other");
    }

    #[test]
    fn test_column_widths() {
        let table = Table::from_rows(
            &["id", "description"],
            vec![vec![CellValue::Int(1), CellValue::from("x".repeat(80))]],
        );
        let widths = column_widths(&table, &AutoWidthConfig::default());
        // "id" -> floor(2 * 1.2) + 2 = 4, clamped up to 8; long text clamped to 50
        assert_eq!(widths, vec![8.0, 50.0]);

        let table = Table::from_rows(&["identifier"], vec![vec![CellValue::Int(1)]]);
        // floor(10 * 1.2) + 2
        assert_eq!(column_widths(&table, &AutoWidthConfig::default()), vec![14.0]);
    }

    #[test]
    fn test_column_widths_custom_bounds() {
        let table = Table::from_rows(
            &["id", "description"],
            vec![vec![CellValue::Int(1), CellValue::from("x".repeat(80))]],
        );
        let config = AutoWidthConfig::default().with_bounds(4.0, 20.0);
        assert_eq!(column_widths(&table, &config), vec![4.0, 20.0]);
    }

    #[test]
    fn test_write_workbook_without_auto_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.xlsx");
        let mut workbook = Workbook::new();
        workbook.insert(
            "Data",
            Table::from_rows(&["id", "name"], vec![vec![CellValue::Int(1), "Jo".into()]]),
        );

        write_workbook(&workbook, &path, &AutoWidthConfig::disabled()).unwrap();

        let back = read_sheet(&path, &SheetSelector::Name("Data".into())).unwrap();
        assert_eq!(back.value(0, "name"), Some(&CellValue::from("Jo")));
        assert!(matches!(
            write_workbook(&Workbook::new(), &path, &AutoWidthConfig::disabled()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_csvs_to_excel() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("orders.csv");
        let b = dir.path().join("customers.csv");
        std::fs::write(&a, "id,total\n1,9.5\n").unwrap();
        std::fs::write(&b, "id,name\n1,Jo\n2,Bo\n").unwrap();
        let out = dir.path().join("book.xlsx");

        csvs_to_excel(&[a.as_path(), b.as_path()], &out, None).unwrap();

        assert_eq!(sheet_names(&out).unwrap(), vec!["orders", "customers"]);
        let customers = read_sheet(&out, &SheetSelector::Name("customers".into())).unwrap();
        assert_eq!(customers.row_count(), 2);
        assert_eq!(customers.value(1, "name"), Some(&CellValue::from("Bo")));
    }

    #[test]
    fn test_csvs_to_excel_name_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        std::fs::write(&a, "id\n1\n").unwrap();
        let names = vec!["one".to_string(), "two".to_string()];
        let out = dir.path().join("o.xlsx");
        let err = csvs_to_excel(&[a.as_path()], &out, Some(names.as_slice())).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
