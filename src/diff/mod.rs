//! Diff engine for comparing tables side by side

pub mod cell_diff;
mod row_diff;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DiffConfig, ReadOptions};
use crate::error::Result;
use crate::model::{CellValue, Column, Row, Table};
use crate::parser::{file_label, read_table};

pub use cell_diff::CellComparator;
pub use row_diff::{RowMatcher, RowPair};

/// Classification of an aligned row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Match,
    Diff,
    OnlyA,
    OnlyB,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Match => "MATCH",
            RowStatus::Diff => "DIFF",
            RowStatus::OnlyA => "ONLY_A",
            RowStatus::OnlyB => "ONLY_B",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary counts; `total` is always the sum of the other four
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub total: usize,
    pub matching: usize,
    pub different: usize,
    pub only_a: usize,
    pub only_b: usize,
}

impl DiffStats {
    fn record(&mut self, status: RowStatus) {
        self.total += 1;
        match status {
            RowStatus::Match => self.matching += 1,
            RowStatus::Diff => self.different += 1,
            RowStatus::OnlyA => self.only_a += 1,
            RowStatus::OnlyB => self.only_b += 1,
        }
    }

    /// Check if there are any differences
    pub fn has_differences(&self) -> bool {
        self.different > 0 || self.only_a > 0 || self.only_b > 0
    }
}

/// One aligned row: values of every compared column from both sides
#[derive(Debug, Clone)]
pub struct DiffRow {
    /// Position in the aligned sequence, before any filtering
    pub index: usize,
    pub status: RowStatus,
    pub left: Vec<CellValue>,
    pub right: Vec<CellValue>,
    /// Indices into `DiffResult::columns` whose values differ
    pub changed: Vec<usize>,
}

impl DiffRow {
    pub fn is_changed(&self, column: usize) -> bool {
        self.changed.contains(&column)
    }
}

/// Result of comparing two tables
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Column names shown side by side
    pub columns: Vec<String>,
    pub rows: Vec<DiffRow>,
    pub stats: DiffStats,
}

impl DiffResult {
    /// Header of the flat comparison table
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Row_Index".to_string(), "Status".to_string()];
        for column in &self.columns {
            headers.push(format!("{}_A", column));
            headers.push(format!("{}_B", column));
        }
        headers
    }

    /// Cells of one output row, laid out like `headers`
    pub fn flat_cells(&self, row: &DiffRow) -> Vec<CellValue> {
        let mut cells = Vec::with_capacity(2 + self.columns.len() * 2);
        cells.push(CellValue::Int(row.index as i64));
        cells.push(CellValue::from(row.status.as_str()));
        for (a, b) in row.left.iter().zip(&row.right) {
            cells.push(a.clone());
            cells.push(b.clone());
        }
        cells
    }

    /// Rows with the given status
    pub fn rows_with_status(&self, status: RowStatus) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(move |r| r.status == status)
    }

    /// The flat comparison table: `Row_Index`, `Status`, then `<col>_A`, `<col>_B`
    pub fn to_table(&self) -> Table {
        self.build_table(self.rows.iter())
    }

    /// Flat table holding only rows with the given status
    pub fn status_table(&self, status: RowStatus) -> Table {
        self.build_table(self.rows_with_status(status))
    }

    fn build_table<'a>(&self, rows: impl Iterator<Item = &'a DiffRow>) -> Table {
        let mut table = Table::new(self.headers().into_iter().map(Column::new).collect());
        for row in rows {
            table.add_row(self.flat_cells(row), 0);
        }
        table.infer_column_types();
        table
    }
}

/// Main diff engine
pub struct DiffEngine {
    config: DiffConfig,
    cell_comparator: CellComparator,
}

impl DiffEngine {
    /// Create a new diff engine with configuration
    pub fn new(config: DiffConfig) -> Self {
        let cell_comparator = CellComparator::from_config(&config);
        Self {
            config,
            cell_comparator,
        }
    }

    /// Compare two tables
    pub fn diff(&self, table_a: &Table, table_b: &Table) -> Result<DiffResult> {
        info!(
            "Comparing {} ({} rows) with {} ({} rows)",
            table_a.label(),
            table_a.row_count(),
            table_b.label(),
            table_b.row_count()
        );

        let columns = self.compared_columns(table_a, table_b);
        let a_idx: Vec<Option<usize>> = columns.iter().map(|c| table_a.column_index(c)).collect();
        let b_idx: Vec<Option<usize>> = columns.iter().map(|c| table_b.column_index(c)).collect();
        let skip: Vec<bool> = columns
            .iter()
            .map(|c| self.config.ignore_columns.contains(c))
            .collect();

        let matcher = RowMatcher::new(&self.config.key_columns)
            .with_comparator(self.cell_comparator.clone());
        let pairs = matcher.match_rows(table_a, table_b)?;

        let mut result = DiffResult {
            columns,
            ..DiffResult::default()
        };

        for (index, (row_a, row_b)) in pairs.into_iter().enumerate() {
            let left = project(row_a, &a_idx);
            let right = project(row_b, &b_idx);

            let changed: Vec<usize> = (0..left.len())
                .filter(|&i| !skip[i] && !self.cell_comparator.equal(&left[i], &right[i]))
                .collect();

            let status = match (row_a, row_b) {
                (Some(_), None) => RowStatus::OnlyA,
                (None, Some(_)) => RowStatus::OnlyB,
                _ if changed.is_empty() => RowStatus::Match,
                _ => RowStatus::Diff,
            };
            result.stats.record(status);

            if self.config.show_only_diffs && status == RowStatus::Match {
                continue;
            }

            let changed = if status == RowStatus::Diff {
                changed
            } else {
                Vec::new()
            };
            result.rows.push(DiffRow {
                index,
                status,
                left,
                right,
                changed,
            });
        }

        info!(
            "Compared {} rows: {} matching, {} different, {} only in A, {} only in B",
            result.stats.total,
            result.stats.matching,
            result.stats.different,
            result.stats.only_a,
            result.stats.only_b
        );
        Ok(result)
    }

    /// A's columns then B's extras, or the shared columns sorted by name
    fn compared_columns(&self, table_a: &Table, table_b: &Table) -> Vec<String> {
        if self.config.ignore_column_order {
            let mut shared: Vec<String> = table_a
                .column_names()
                .into_iter()
                .filter(|c| table_b.column_index(c).is_some())
                .collect();
            shared.sort();
            shared
        } else {
            let mut all = table_a.column_names();
            for name in table_b.column_names() {
                if !all.contains(&name) {
                    all.push(name);
                }
            }
            all
        }
    }
}

/// Values of `row` at each mapped column; absent rows and columns give `Null`
fn project(row: Option<&Row>, mapping: &[Option<usize>]) -> Vec<CellValue> {
    mapping
        .iter()
        .map(|idx| {
            row.zip(*idx)
                .and_then(|(r, i)| r.get(i).cloned())
                .unwrap_or(CellValue::Null)
        })
        .collect()
}

/// Compare two tables
pub fn diff(table_a: &Table, table_b: &Table, config: &DiffConfig) -> Result<DiffResult> {
    DiffEngine::new(config.clone()).diff(table_a, table_b)
}

/// Load two files and compare them
pub fn diff_files(
    path_a: &Path,
    path_b: &Path,
    config: &DiffConfig,
    options: &ReadOptions,
) -> Result<DiffResult> {
    let table_a = read_table(path_a, options)?.with_source(file_label(path_a));
    let table_b = read_table(path_b, options)?.with_source(file_label(path_b));
    diff(&table_a, &table_b, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(rows: &[(i64, &str)]) -> Table {
        Table::from_rows(
            &["id", "name"],
            rows.iter()
                .map(|(id, name)| vec![CellValue::Int(*id), CellValue::from(*name)]),
        )
    }

    fn keyed() -> DiffConfig {
        DiffConfig::new().with_key_columns(vec!["id".to_string()])
    }

    #[test]
    fn test_keyed_scenario() {
        let a = people(&[(1, "Jo"), (2, "Bo")]);
        let b = people(&[(1, "Jo"), (2, "Bobby")]);

        let result = diff(&a, &b, &keyed()).unwrap();

        assert_eq!(
            result.stats,
            DiffStats {
                total: 2,
                matching: 1,
                different: 1,
                only_a: 0,
                only_b: 0,
            }
        );
        assert_eq!(result.rows[1].status, RowStatus::Diff);
        assert_eq!(result.rows[1].changed, vec![1]);
    }

    #[test]
    fn test_self_diff_has_no_differences() {
        let a = people(&[(1, "Jo"), (2, "Bo"), (3, "Al")]);
        let result = diff(&a, &a, &keyed()).unwrap();
        assert_eq!(result.stats.different, 0);
        assert_eq!(result.stats.only_a, 0);
        assert_eq!(result.stats.only_b, 0);
        assert_eq!(result.stats.matching, 3);
    }

    #[test]
    fn test_positional_unequal_lengths() {
        let a = people(&[(1, "Jo"), (2, "Bo"), (3, "Al")]);
        let b = people(&[(1, "Jo")]);
        let result = diff(&a, &b, &DiffConfig::new()).unwrap();

        assert_eq!(result.stats.total, 3);
        assert_eq!(result.stats.only_a, 2);
        assert!(result.rows[2].right.iter().all(CellValue::is_null));
    }

    #[test]
    fn test_only_b_rows_follow_a() {
        let a = people(&[(1, "Jo")]);
        let b = people(&[(7, "Zed"), (1, "Jo")]);
        let result = diff(&a, &b, &keyed()).unwrap();

        let statuses: Vec<_> = result.rows.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![RowStatus::Match, RowStatus::OnlyB]);
        assert_eq!(result.rows[1].right[0], CellValue::Int(7));
    }

    #[test]
    fn test_show_only_diffs_keeps_stats() {
        let a = people(&[(1, "Jo"), (2, "Bo")]);
        let b = people(&[(1, "Jo"), (2, "Bobby")]);
        let config = keyed().with_show_only_diffs(true);
        let result = diff(&a, &b, &config).unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].index, 1);
        assert_eq!(result.stats.matching, 1);
        assert_eq!(result.stats.total, 2);
    }

    #[test]
    fn test_normalisation_flags() {
        let a = people(&[(1, " Jo ")]);
        let b = people(&[(1, "jo")]);

        let strict = diff(&a, &b, &keyed()).unwrap();
        assert_eq!(strict.stats.different, 1);

        let relaxed = diff(
            &a,
            &b,
            &keyed().with_ignore_whitespace(true).with_case_insensitive(true),
        )
        .unwrap();
        assert_eq!(relaxed.stats.matching, 1);
        // Stored values are left as read
        assert_eq!(relaxed.rows[0].left[1], CellValue::from(" Jo "));
    }

    #[test]
    fn test_keys_align_after_normalisation() {
        let a = Table::from_rows(&["code", "v"], vec![vec!["ABC ".into(), CellValue::Int(1)]]);
        let b = Table::from_rows(&["code", "v"], vec![vec!["abc".into(), CellValue::Int(1)]]);
        let config = DiffConfig::new()
            .with_key_columns(vec!["code".to_string()])
            .with_ignore_whitespace(true)
            .with_case_insensitive(true);

        let result = diff(&a, &b, &config).unwrap();
        assert_eq!(result.stats.total, 1);
        assert_eq!(result.stats.matching, 1);
        assert_eq!(result.rows[0].left[0], CellValue::from("ABC "));

        let keyed_raw = DiffConfig::new().with_key_columns(vec!["code".to_string()]);
        let raw = diff(&a, &b, &keyed_raw).unwrap();
        assert_eq!(raw.stats.only_a, 1);
        assert_eq!(raw.stats.only_b, 1);
    }

    #[test]
    fn test_duplicate_key_after_normalisation() {
        let a = Table::from_rows(&["code"], vec![vec!["abc".into()], vec![" ABC".into()]])
            .with_source("a.csv");
        let b = Table::from_rows(&["code"], vec![vec!["abc".into()]]);
        let config = DiffConfig::new()
            .with_key_columns(vec!["code".to_string()])
            .with_ignore_whitespace(true)
            .with_case_insensitive(true);

        let err = diff(&a, &b, &config).unwrap_err();
        assert!(matches!(err, crate::Error::DuplicateKey { ref table, .. } if table == "a.csv"));
    }

    #[test]
    fn test_ignore_columns_and_column_order() {
        let a = Table::from_rows(
            &["id", "name", "updated"],
            vec![vec![CellValue::Int(1), "Jo".into(), "mon".into()]],
        );
        let b = Table::from_rows(
            &["updated", "id", "name", "extra"],
            vec![vec!["tue".into(), CellValue::Int(1), "Jo".into(), CellValue::Int(5)]],
        );

        let config = keyed()
            .with_ignore_columns(vec!["updated".to_string()])
            .with_ignore_column_order(true);
        let result = diff(&a, &b, &config).unwrap();

        assert_eq!(result.columns, vec!["id", "name", "updated"]);
        assert_eq!(result.stats.matching, 1);

        let union = diff(&a, &b, &keyed()).unwrap();
        assert_eq!(union.columns, vec!["id", "name", "updated", "extra"]);
        assert_eq!(union.stats.different, 1);
    }

    #[test]
    fn test_to_table_layout() {
        let a = people(&[(1, "Jo")]);
        let b = people(&[(1, "Bo")]);
        let table = diff(&a, &b, &keyed()).unwrap().to_table();

        assert_eq!(
            table.column_names(),
            vec!["Row_Index", "Status", "id_A", "id_B", "name_A", "name_B"]
        );
        assert_eq!(table.value(0, "Status"), Some(&CellValue::from("DIFF")));
        assert_eq!(table.value(0, "name_B"), Some(&CellValue::from("Bo")));
    }

    #[test]
    fn test_stats_serialize() {
        let stats = DiffStats {
            total: 3,
            matching: 1,
            different: 1,
            only_a: 1,
            only_b: 0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"total":3,"matching":1,"different":1,"only_a":1,"only_b":0}"#
        );
        assert_eq!(serde_json::to_string(&RowStatus::OnlyA).unwrap(), "\"ONLY_A\"");
    }
}
