//! Relational joins over tables

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::{JoinMode, ReadOptions, SheetSelector};
use crate::error::{Error, Result};
use crate::model::{CellValue, Column, KeyBuilder, Row, RowKey, Table};
use crate::parser::{file_label, read_sheet, read_table};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Column layout and key positions shared by every output row
struct JoinPlan {
    columns: Vec<String>,
    left_keys: KeyBuilder,
    right_keys: KeyBuilder,
    /// Right-table columns carried into the output, in order
    right_carried: Vec<usize>,
}

impl JoinPlan {
    fn new(left: &Table, right: &Table, on: &[String], how: JoinMode) -> Result<Self> {
        let left_keys = KeyBuilder::for_table(left, on)?;
        let right_keys = KeyBuilder::for_table(right, on)?;

        let left_names = left.column_names();
        let right_names = right.column_names();

        let right_carried: Vec<usize> = (0..right_names.len())
            .filter(|i| how == JoinMode::Cross || !right_keys.column_indices().contains(i))
            .collect();

        let is_key = |name: &String| how != JoinMode::Cross && on.contains(name);
        let collides_right = |name: &String| {
            !is_key(name) && right_carried.iter().any(|&j| &right_names[j] == name)
        };
        let collides_left = |name: &String| !is_key(name) && left_names.contains(name);

        let mut columns: Vec<String> = left_names
            .iter()
            .map(|name| {
                if collides_right(name) {
                    format!("{}{}", name, LEFT_SUFFIX)
                } else {
                    name.clone()
                }
            })
            .collect();
        columns.extend(right_carried.iter().map(|&j| {
            let name = &right_names[j];
            if collides_left(name) {
                format!("{}{}", name, RIGHT_SUFFIX)
            } else {
                name.clone()
            }
        }));

        Ok(Self {
            columns,
            left_keys,
            right_keys,
            right_carried,
        })
    }

    /// One output row; a missing left side takes its key cells from the right row
    fn combine(
        &self,
        left_width: usize,
        left: Option<&Row>,
        right: Option<&Row>,
    ) -> Vec<CellValue> {
        let mut cells = Vec::with_capacity(self.columns.len());

        match left {
            Some(row) => cells.extend(row.cells.iter().cloned()),
            None => {
                cells.resize(left_width, CellValue::Null);
                if let Some(row) = right {
                    let pairs = self
                        .left_keys
                        .column_indices()
                        .iter()
                        .zip(self.right_keys.column_indices());
                    for (&l, &r) in pairs {
                        cells[l] = row.get(r).cloned().unwrap_or(CellValue::Null);
                    }
                }
            }
        }

        cells.extend(self.right_carried.iter().map(|&j| {
            right
                .and_then(|row| row.get(j).cloned())
                .unwrap_or(CellValue::Null)
        }));
        cells
    }
}

/// Row indices of `table` grouped by key, each group in table order
fn index_by_key(table: &Table, keys: &KeyBuilder) -> FxHashMap<RowKey, Vec<usize>> {
    let mut index: FxHashMap<RowKey, Vec<usize>> = FxHashMap::default();
    for (i, row) in table.rows.iter().enumerate() {
        index.entry(keys.row_key(row)).or_default().push(i);
    }
    index
}

/// Join two tables on the key columns `on`
///
/// Output columns are the left columns followed by the right non-key
/// columns; clashing non-key names get `_x` and `_y`. `Cross` takes no keys
/// and yields the full product.
pub fn join(left: &Table, right: &Table, on: &[String], how: JoinMode) -> Result<Table> {
    match how {
        JoinMode::Cross if !on.is_empty() => {
            return Err(Error::InvalidArgument(
                "cross join does not take key columns".to_string(),
            ))
        }
        JoinMode::Cross => {}
        _ if on.is_empty() => {
            return Err(Error::InvalidArgument(format!(
                "{} join needs at least one key column",
                how
            )))
        }
        _ => {}
    }

    info!(
        "Joining {} and {} on {:?} (how={})",
        left.label(),
        right.label(),
        on,
        how
    );

    let plan = JoinPlan::new(left, right, on, how)?;
    let width = left.column_count();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    match how {
        JoinMode::Cross => {
            for l in &left.rows {
                for r in &right.rows {
                    rows.push(plan.combine(width, Some(l), Some(r)));
                }
            }
        }
        JoinMode::Right => {
            let left_index = index_by_key(left, &plan.left_keys);
            for r in &right.rows {
                match left_index.get(&plan.right_keys.row_key(r)) {
                    Some(matches) => {
                        for &i in matches {
                            rows.push(plan.combine(width, Some(&left.rows[i]), Some(r)));
                        }
                    }
                    None => rows.push(plan.combine(width, None, Some(r))),
                }
            }
        }
        JoinMode::Inner | JoinMode::Left | JoinMode::Outer => {
            let right_index = index_by_key(right, &plan.right_keys);
            let mut matched = vec![false; right.row_count()];

            for l in &left.rows {
                match right_index.get(&plan.left_keys.row_key(l)) {
                    Some(matches) => {
                        for &j in matches {
                            matched[j] = true;
                            rows.push(plan.combine(width, Some(l), Some(&right.rows[j])));
                        }
                    }
                    None if how != JoinMode::Inner => rows.push(plan.combine(width, Some(l), None)),
                    None => {}
                }
            }

            if how == JoinMode::Outer {
                for (r, _) in right.rows.iter().zip(&matched).filter(|(_, m)| !**m) {
                    rows.push(plan.combine(width, None, Some(r)));
                }
            }
        }
    }

    let mut result = Table::new(plan.columns.iter().map(Column::new).collect());
    for (i, cells) in rows.into_iter().enumerate() {
        result.add_row(cells, i + 2);
    }
    result.infer_column_types();
    result.source = Some(format!("{} ⋈ {}", left.label(), right.label()));

    info!("Join produced {} rows", result.row_count());
    Ok(result)
}

/// Fold `join` left to right over two or more tables
pub fn join_sequential(tables: &[Table], on: &[String], how: JoinMode) -> Result<Table> {
    if tables.len() < 2 {
        return Err(Error::InvalidArgument(format!(
            "Need at least 2 tables to join, got {}",
            tables.len()
        )));
    }

    let mut result = join(&tables[0], &tables[1], on, how)?;
    for (i, table) in tables.iter().enumerate().skip(2) {
        debug!("Joining table {}/{}: {}", i + 1, tables.len(), table.label());
        result = join(&result, table, on, how)?;
    }
    Ok(result)
}

/// Load files and join them in order
pub fn join_files<P: AsRef<Path>>(files: &[P], on: &[String], how: JoinMode) -> Result<Table> {
    let tables = files
        .iter()
        .map(|f| -> Result<Table> {
            let path = f.as_ref();
            Ok(read_table(path, &ReadOptions::default())?.with_source(file_label(path)))
        })
        .collect::<Result<Vec<_>>>()?;
    join_sequential(&tables, on, how)
}

/// Join two sheets of the same workbook
pub fn join_sheets(
    path: &Path,
    left_sheet: &SheetSelector,
    right_sheet: &SheetSelector,
    on: &[String],
    how: JoinMode,
) -> Result<Table> {
    info!(
        "Joining sheets '{}' and '{}' from {}",
        left_sheet,
        right_sheet,
        path.display()
    );
    let left = read_sheet(path, left_sheet)?;
    let right = read_sheet(path, right_sheet)?;
    join(&left, &right, on, how)
}
