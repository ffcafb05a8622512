//! Cell-level comparison logic

use std::borrow::Cow;

use crate::config::DiffConfig;
use crate::model::{CellValue, RowKey};

/// Cell comparator with configurable options
///
/// Normalisation is applied to both sides at comparison time; the stored
/// values are never touched, so reports show the original text.
#[derive(Debug, Clone, Default)]
pub struct CellComparator {
    ignore_case: bool,
    ignore_whitespace: bool,
    numeric_tolerance: Option<f64>,
}

impl CellComparator {
    /// Create a new cell comparator
    pub fn new(ignore_case: bool, ignore_whitespace: bool, numeric_tolerance: Option<f64>) -> Self {
        Self {
            ignore_case,
            ignore_whitespace,
            numeric_tolerance,
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new(
            config.case_insensitive,
            config.ignore_whitespace,
            config.numeric_tolerance,
        )
    }

    /// Compare two cell values for equality
    pub fn equal(&self, a: &CellValue, b: &CellValue) -> bool {
        if let Some(tolerance) = self.numeric_tolerance {
            if a.equals_with_tolerance(b, tolerance) {
                return true;
            }
        }

        match (a, b) {
            (CellValue::String(x), CellValue::String(y)) => self.normalize(x) == self.normalize(y),
            _ => a == b,
        }
    }

    /// Key cells as they are compared: strings normalised, other cells unchanged
    pub fn normalize_key(&self, key: RowKey) -> RowKey {
        if !self.ignore_case && !self.ignore_whitespace {
            return key;
        }
        key.into_iter()
            .map(|cell| match cell {
                CellValue::String(s) => {
                    CellValue::String(Cow::Owned(self.normalize(&s).into_owned()))
                }
                other => other,
            })
            .collect()
    }

    fn normalize<'a>(&self, s: &'a str) -> Cow<'a, str> {
        let s = if self.ignore_whitespace { s.trim() } else { s };
        if self.ignore_case {
            Cow::Owned(s.to_lowercase())
        } else {
            Cow::Borrowed(s)
        }
    }
}
