//! Combine same-named sheets across workbooks

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{MergeMode, SheetScope, SheetSelector, UnionOptions};
use crate::error::{Error, Result};
use crate::model::{Table, Workbook};
use crate::parser::{file_label, read_sheet, sheet_names};
use crate::union::{same_column_set, union};

/// Sheet names present in every file; empty for no files
pub fn get_common_sheets<P: AsRef<Path>>(files: &[P]) -> Result<BTreeSet<String>> {
    let mut common: Option<BTreeSet<String>> = None;
    for file in files {
        let names: BTreeSet<String> = sheet_names(file.as_ref())?.into_iter().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&names).cloned().collect(),
            None => names,
        });
    }
    Ok(common.unwrap_or_default())
}

/// Merge sheets by name across workbooks
///
/// Sheet names are processed in sorted order. With `SheetScope::All` a sheet
/// is merged from the files that have it; `SheetScope::Common` keeps only the
/// sheets found in every file.
pub fn merge_by_sheet_name<P: AsRef<Path>>(
    files: &[P],
    mode: MergeMode,
    scope: SheetScope,
) -> Result<Workbook> {
    if files.is_empty() {
        return Err(Error::InvalidArgument(
            "excel files list cannot be empty".to_string(),
        ));
    }

    info!("Merging {} Excel files in '{}' mode", files.len(), mode);

    let file_sheets: Vec<(PathBuf, Vec<String>)> = files
        .iter()
        .map(|f| -> Result<(PathBuf, Vec<String>)> {
            let path = f.as_ref();
            Ok((path.to_path_buf(), sheet_names(path)?))
        })
        .collect::<Result<_>>()?;

    let selected: BTreeSet<String> = match scope {
        SheetScope::All => file_sheets
            .iter()
            .flat_map(|(_, names)| names.iter().cloned())
            .collect(),
        SheetScope::Common => {
            let common = get_common_sheets(files)?;
            if common.is_empty() {
                return Err(Error::InvalidArgument(
                    "No common sheets found across all files".to_string(),
                ));
            }
            common
        }
    };
    info!("Found {} sheet names: {:?}", selected.len(), selected);

    let mut workbook = Workbook::new();
    for sheet in &selected {
        debug!("Processing sheet: '{}'", sheet);
        let mut tables = Vec::new();
        for (path, names) in &file_sheets {
            if names.contains(sheet) {
                tables.push((path.clone(), load_sheet(path, sheet)?));
            }
        }
        if tables.is_empty() {
            warn!("No data found for sheet '{}', skipping", sheet);
            continue;
        }

        let merged = merge_tables(sheet, &tables, mode)?;
        info!(
            "  Merged '{}': {} rows, {} columns",
            sheet,
            merged.row_count(),
            merged.column_count()
        );
        workbook.insert(sheet.clone(), merged);
    }

    if workbook.is_empty() {
        return Err(Error::InvalidArgument(
            "No sheets were successfully merged".to_string(),
        ));
    }
    Ok(workbook)
}

/// Merge one named sheet; files without it are skipped
pub fn merge_sheet<P: AsRef<Path>>(files: &[P], sheet: &str, mode: MergeMode) -> Result<Table> {
    info!("Merging sheet '{}' from {} files", sheet, files.len());

    let mut tables = Vec::new();
    for file in files {
        let path = file.as_ref();
        if !sheet_names(path)?.iter().any(|n| n == sheet) {
            warn!("Sheet '{}' not found in {}, skipping", sheet, path.display());
            continue;
        }
        tables.push((path.to_path_buf(), load_sheet(path, sheet)?));
    }

    if tables.is_empty() {
        return Err(Error::SheetNotFound {
            path: files
                .first()
                .map(|f| f.as_ref().to_path_buf())
                .unwrap_or_default(),
            sheet: sheet.to_string(),
        });
    }

    merge_tables(sheet, &tables, mode)
}

fn load_sheet(path: &Path, sheet: &str) -> Result<Table> {
    let table = read_sheet(path, &SheetSelector::Name(sheet.to_string()))?;
    debug!(
        "  {}: {} rows, {} columns",
        file_label(path),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Concatenate the collected copies of one sheet
fn merge_tables(sheet: &str, tables: &[(PathBuf, Table)], mode: MergeMode) -> Result<Table> {
    let (reference_path, reference) = &tables[0];
    let expected = reference.column_names();

    for (path, table) in &tables[1..] {
        let found = table.column_names();
        if same_column_set(&expected, &found) {
            continue;
        }
        match mode {
            MergeMode::Strict => {
                return Err(Error::ColumnMismatch {
                    sheet: sheet.to_string(),
                    reference: file_label(reference_path),
                    path: path.clone(),
                    expected,
                    found,
                })
            }
            MergeMode::Lenient => {
                debug!("    {}: columns differ, padding missing cells", file_label(path));
            }
        }
    }

    let copies: Vec<Table> = tables.iter().map(|(_, t)| t.clone()).collect();
    let options = UnionOptions::default().with_schema(mode.into());
    union(&copies, &options).map(|t| t.with_source(sheet.to_string()))
}
