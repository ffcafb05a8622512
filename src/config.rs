//! Option types shared by the engines, readers and writers

use std::fmt;

/// Which sheet of a workbook to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    /// 0-based position
    Index(usize),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl std::str::FromStr for SheetSelector {
    type Err = String;

    /// All-digit input selects by position, anything else by name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("sheet name cannot be empty".to_string());
        }
        match trimmed.parse::<usize>() {
            Ok(index) => Ok(SheetSelector::Index(index)),
            Err(_) => Ok(SheetSelector::Name(trimmed.to_string())),
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => write!(f, "{}", name),
            SheetSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Options applied when loading a file into a table
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// For workbooks: which sheet to read (first sheet if unset)
    pub sheet: Option<SheetSelector>,
    /// Keep only the first N data rows
    pub max_rows: Option<usize>,
}

impl ReadOptions {
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = Some(sheet);
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}

/// Column reconciliation policy for unions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Column sets must be identical
    Strict,
    /// Superset of columns, absent cells filled with the missing marker
    #[default]
    Lenient,
}

/// Options for the union engine
#[derive(Debug, Clone, Default)]
pub struct UnionOptions {
    /// Drop repeated rows, keeping the first occurrence
    pub dedupe: bool,
    /// Columns forming the dedupe key (all columns when empty)
    pub dedupe_columns: Vec<String>,
    pub schema: SchemaPolicy,
}

impl UnionOptions {
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn with_dedupe_columns(mut self, columns: Vec<String>) -> Self {
        self.dedupe_columns = columns;
        self
    }

    pub fn with_schema(mut self, schema: SchemaPolicy) -> Self {
        self.schema = schema;
        self
    }
}

/// Relational join mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinMode {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
    Cross,
}

impl std::str::FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" => Ok(JoinMode::Outer),
            "cross" => Ok(JoinMode::Cross),
            other => Err(format!(
                "Invalid join type '{}'. Must be one of: inner, left, right, outer, cross",
                other
            )),
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
            JoinMode::Cross => "cross",
        };
        f.write_str(name)
    }
}

/// Column reconciliation policy for same-named sheets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    Strict,
    #[default]
    Lenient,
}

impl std::str::FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(MergeMode::Strict),
            "lenient" => Ok(MergeMode::Lenient),
            other => Err(format!("mode must be 'strict' or 'lenient', got '{}'", other)),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Strict => f.write_str("strict"),
            MergeMode::Lenient => f.write_str("lenient"),
        }
    }
}

impl From<MergeMode> for SchemaPolicy {
    fn from(mode: MergeMode) -> Self {
        match mode {
            MergeMode::Strict => SchemaPolicy::Strict,
            MergeMode::Lenient => SchemaPolicy::Lenient,
        }
    }
}

/// Which sheet names a workbook merge covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetScope {
    /// Sheets present in any input
    #[default]
    All,
    /// Sheets present in every input
    Common,
}

/// Configuration for diff operations
#[derive(Debug, Clone, Default)]
pub struct DiffConfig {
    /// Columns used to align rows; positional alignment when empty
    pub key_columns: Vec<String>,
    /// Trim leading/trailing whitespace before comparing strings
    pub ignore_whitespace: bool,
    /// Fold case before comparing strings
    pub case_insensitive: bool,
    /// Tolerance for numeric comparisons
    pub numeric_tolerance: Option<f64>,
    /// Columns left out of the comparison
    pub ignore_columns: Vec<String>,
    /// Compare only shared columns, matched by name
    pub ignore_column_order: bool,
    /// Drop MATCH rows from the output (stats still count them)
    pub show_only_diffs: bool,
}

impl DiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set key columns for row matching
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Enable whitespace-insensitive comparison
    pub fn with_ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    /// Enable case-insensitive comparison
    pub fn with_case_insensitive(mut self, insensitive: bool) -> Self {
        self.case_insensitive = insensitive;
        self
    }

    /// Set numeric tolerance for float comparisons
    pub fn with_numeric_tolerance(mut self, tolerance: f64) -> Self {
        self.numeric_tolerance = Some(tolerance);
        self
    }

    /// Set columns to ignore
    pub fn with_ignore_columns(mut self, columns: Vec<String>) -> Self {
        self.ignore_columns = columns;
        self
    }

    pub fn with_ignore_column_order(mut self, ignore: bool) -> Self {
        self.ignore_column_order = ignore;
        self
    }

    pub fn with_show_only_diffs(mut self, only_diffs: bool) -> Self {
        self.show_only_diffs = only_diffs;
        self
    }
}

/// Column width auto-sizing for written sheets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoWidthConfig {
    pub enabled: bool,
    pub min_width: f64,
    pub max_width: f64,
    /// Extra characters added to the measured width
    pub padding: f64,
    /// Header lengths are multiplied by this before comparing
    pub header_factor: f64,
}

impl Default for AutoWidthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_width: 8.0,
            max_width: 50.0,
            padding: 2.0,
            header_factor: 1.2,
        }
    }
}

impl AutoWidthConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, min_width: f64, max_width: f64) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }
}

/// Options for exporting a diff report workbook
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Display name for the left input
    pub file_a_name: String,
    /// Display name for the right input
    pub file_b_name: String,
    /// Colour rows by status
    pub highlight: bool,
    pub auto_width: AutoWidthConfig,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_a_name: "File A".to_string(),
            file_b_name: "File B".to_string(),
            highlight: true,
            auto_width: AutoWidthConfig::default(),
        }
    }
}

impl ExportOptions {
    pub fn with_names(mut self, file_a: impl Into<String>, file_b: impl Into<String>) -> Self {
        self.file_a_name = file_a.into();
        self.file_b_name = file_b.into();
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Split a comma-separated list, trimming entries and dropping empties
pub fn parse_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
