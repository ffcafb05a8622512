//! Row alignment: by position, or by key columns

use rustc_hash::FxHashMap;

use super::cell_diff::CellComparator;
use crate::error::{Error, Result};
use crate::model::{format_key, KeyBuilder, Row, RowKey, Table};

/// A left row, a right row, or both
pub type RowPair<'a> = (Option<&'a Row>, Option<&'a Row>);

/// Row matcher using hash-based lookup on key columns
pub struct RowMatcher {
    key_columns: Vec<String>,
    comparator: CellComparator,
}

impl RowMatcher {
    /// Create a new row matcher; no key columns means positional alignment
    pub fn new(key_columns: &[String]) -> Self {
        Self {
            key_columns: key_columns.to_vec(),
            comparator: CellComparator::default(),
        }
    }

    /// Match keys the way `comparator` compares strings
    pub fn with_comparator(mut self, comparator: CellComparator) -> Self {
        self.comparator = comparator;
        self
    }

    fn lookup_key(&self, keys: &KeyBuilder, row: &Row) -> RowKey {
        self.comparator.normalize_key(keys.row_key(row))
    }

    /// Pair the rows of `left` and `right`
    ///
    /// Keyed pairs come in left order, followed by right-only rows in right order.
    pub fn match_rows<'a>(&self, left: &'a Table, right: &'a Table) -> Result<Vec<RowPair<'a>>> {
        if self.key_columns.is_empty() {
            Ok(match_by_position(left, right))
        } else {
            self.match_by_key(left, right)
        }
    }

    fn match_by_key<'a>(&self, left: &'a Table, right: &'a Table) -> Result<Vec<RowPair<'a>>> {
        let left_keys = KeyBuilder::for_table(left, &self.key_columns)?;
        let right_keys = KeyBuilder::for_table(right, &self.key_columns)?;

        // Uniqueness on the left is checked as a side effect of indexing
        self.index_rows(left, &left_keys)?;
        let right_index = self.index_rows(right, &right_keys)?;

        let mut matched = vec![false; right.row_count()];
        let mut pairs = Vec::with_capacity(left.row_count().max(right.row_count()));

        for row in &left.rows {
            match right_index.get(&self.lookup_key(&left_keys, row)) {
                Some(&idx) => {
                    matched[idx] = true;
                    pairs.push((Some(row), Some(&right.rows[idx])));
                }
                None => pairs.push((Some(row), None)),
            }
        }

        pairs.extend(
            right
                .rows
                .iter()
                .zip(&matched)
                .filter(|(_, seen)| !**seen)
                .map(|(row, _)| (None, Some(row))),
        );

        Ok(pairs)
    }

    /// Map each lookup key to its row index, rejecting repeated keys
    fn index_rows(&self, table: &Table, keys: &KeyBuilder) -> Result<FxHashMap<RowKey, usize>> {
        let mut index = FxHashMap::default();
        index.reserve(table.row_count());

        for (i, row) in table.rows.iter().enumerate() {
            let key = self.lookup_key(keys, row);
            if index.contains_key(&key) {
                return Err(Error::DuplicateKey {
                    key: format_key(&keys.row_key(row)),
                    table: table.label().to_string(),
                });
            }
            index.insert(key, i);
        }

        Ok(index)
    }
}

fn match_by_position<'a>(left: &'a Table, right: &'a Table) -> Vec<RowPair<'a>> {
    let len = left.row_count().max(right.row_count());
    (0..len)
        .map(|i| (left.rows.get(i), right.rows.get(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table(rows: Vec<(i64, &str)>) -> Table {
        Table::from_rows(
            &["id", "name"],
            rows.into_iter()
                .map(|(id, name)| vec![CellValue::Int(id), CellValue::from(name)]),
        )
    }

    fn ids(pairs: &[RowPair<'_>]) -> Vec<(Option<i64>, Option<i64>)> {
        let id = |row: Option<&Row>| {
            row.and_then(|r| match r.get(0) {
                Some(CellValue::Int(i)) => Some(*i),
                _ => None,
            })
        };
        pairs.iter().map(|(l, r)| (id(*l), id(*r))).collect()
    }

    #[test]
    fn test_positional_tail() {
        let a = table(vec![(1, "a"), (2, "b"), (3, "c")]);
        let b = table(vec![(9, "x")]);
        let pairs = RowMatcher::new(&[]).match_rows(&a, &b).unwrap();
        assert_eq!(
            ids(&pairs),
            vec![(Some(1), Some(9)), (Some(2), None), (Some(3), None)]
        );
    }

    #[test]
    fn test_keyed_order() {
        let a = table(vec![(1, "a"), (2, "b"), (3, "c")]);
        let b = table(vec![(4, "d"), (3, "c"), (1, "a")]);
        let pairs = RowMatcher::new(&["id".to_string()]).match_rows(&a, &b).unwrap();
        assert_eq!(
            ids(&pairs),
            vec![
                (Some(1), Some(1)),
                (Some(2), None),
                (Some(3), Some(3)),
                (None, Some(4)),
            ]
        );
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let a = table(vec![(1, "a")]);
        let b = table(vec![(1, "a"), (1, "again")]).with_source("b.csv");
        let err = RowMatcher::new(&["id".to_string()])
            .match_rows(&a, &b)
            .unwrap_err();
        match err {
            Error::DuplicateKey { key, table } => {
                assert_eq!(key, "(1)");
                assert_eq!(table, "b.csv");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_key_column() {
        let a = table(vec![(1, "a")]);
        let b = Table::from_rows(&["name"], vec![vec![CellValue::from("a")]]);
        let err = RowMatcher::new(&["id".to_string()])
            .match_rows(&a, &b)
            .unwrap_err();
        assert!(matches!(err, Error::KeyColumnNotFound { .. }));
    }
}
