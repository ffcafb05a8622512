//! csvexcel - CSV and Excel operations from the command line

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use csvexcel::config::{
    parse_column_list, AutoWidthConfig, DiffConfig, ExportOptions, JoinMode, MergeMode,
    ReadOptions, SchemaPolicy, SheetScope, SheetSelector, UnionOptions,
};
use csvexcel::diff::diff_files;
use csvexcel::join::{join_files, join_sheets};
use csvexcel::merge::{merge_by_sheet_name, merge_sheet};
use csvexcel::model::Workbook;
use csvexcel::output::{
    csvs_to_excel, export_to_workbook, write_csv, write_table, write_workbook, TerminalOutput,
};
use csvexcel::parser::{file_label, is_workbook};
use csvexcel::union::union_files;

/// Union, join, merge and diff CSV and Excel files
#[derive(Parser, Debug)]
#[command(name = "csvexcel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Logging level or filter directives (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine CSV files into one workbook, one sheet per file
    CsvToExcel {
        #[arg(required = true)]
        csv_files: Vec<PathBuf>,
        /// Output Excel file path
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated sheet names
        #[arg(short, long)]
        sheet_names: Option<String>,
    },

    /// Append two files, removing duplicate rows by default
    Union {
        file_a: PathBuf,
        file_b: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Remove duplicate rows (the default)
        #[arg(long, overrides_with = "no_dedupe")]
        dedupe: bool,
        /// Keep duplicate rows
        #[arg(long, overrides_with = "dedupe")]
        no_dedupe: bool,
        /// Comma-separated columns for deduplication
        #[arg(long)]
        dedupe_columns: Option<String>,
    },

    /// Append any number of files
    UnionMultiple {
        #[arg(required = true)]
        csv_files: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Remove duplicate rows
        #[arg(long)]
        dedupe: bool,
        /// Comma-separated columns for deduplication
        #[arg(long)]
        dedupe_columns: Option<String>,
        /// Stream the inputs this many rows at a time
        #[arg(long)]
        chunksize: Option<usize>,
        /// Require every file to have the same columns
        #[arg(long)]
        strict_columns: bool,
    },

    /// Join two or more files in order on key columns
    Join {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        keys: JoinArgs,
    },

    /// Join two sheets of one workbook
    JoinExcelSheets {
        input_file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Left sheet name or index
        #[arg(long)]
        sheet_left: SheetSelector,
        /// Right sheet name or index
        #[arg(long)]
        sheet_right: SheetSelector,
        #[command(flatten)]
        keys: JoinArgs,
        /// Output sheet name
        #[arg(long, default_value = "Joined")]
        output_sheet: String,
    },

    /// Merge same-named sheets across workbooks
    MergeExcel {
        #[arg(required = true)]
        excel_files: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// strict or lenient column handling
        #[arg(long, default_value = "lenient")]
        mode: MergeMode,
        /// Only merge sheets present in every file
        #[arg(long)]
        common_only: bool,
    },

    /// Merge one named sheet across workbooks
    MergeSheet {
        #[arg(required = true)]
        excel_files: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Sheet name to merge
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = "lenient")]
        mode: MergeMode,
    },

    /// Compare two files side by side
    Diff(DiffArgs),
}

#[derive(Args, Debug)]
struct JoinArgs {
    /// Comma-separated join key column(s)
    #[arg(long, default_value = "")]
    on: String,
    /// Join type: inner, left, right, outer, cross
    #[arg(long, default_value = "inner")]
    how: JoinMode,
}

#[derive(Args, Debug)]
struct DiffArgs {
    file_a: PathBuf,
    file_b: PathBuf,
    /// Comma-separated key columns; rows are aligned by position when omitted
    #[arg(long)]
    key_columns: Option<String>,
    /// Trim whitespace before comparing
    #[arg(long)]
    ignore_whitespace: bool,
    /// Ignore case when comparing
    #[arg(long)]
    case_insensitive: bool,
    /// Tolerance for numeric comparisons (e.g., 0.001)
    #[arg(long)]
    numeric_tolerance: Option<f64>,
    /// Comma-separated columns left out of the comparison
    #[arg(long)]
    ignore_columns: Option<String>,
    /// Compare only shared columns, matched by name
    #[arg(long)]
    ignore_column_order: bool,
    /// Leave matching rows out of the output
    #[arg(long)]
    show_only_diffs: bool,
    /// Read at most this many rows from each file
    #[arg(long)]
    max_rows: Option<usize>,
    /// For Excel files: which sheet to compare
    #[arg(long)]
    sheet: Option<SheetSelector>,
    /// Plain report without colours
    #[arg(long)]
    no_highlight: bool,
    /// Report destination: .xlsx for a highlighted workbook, anything else for CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Only print the summary counts as JSON
    #[arg(long)]
    stats_only: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    csvexcel::logging::init(&cli.log_level, cli.log_file.as_deref())
        .context("Failed to initialise logging")?;

    match cli.command {
        Command::CsvToExcel {
            csv_files,
            output,
            sheet_names,
        } => {
            println!("Converting {} CSV files to Excel...", csv_files.len());
            let names = sheet_names.as_deref().map(parse_column_list);
            csvs_to_excel(&csv_files, &output, names.as_deref())?;
            created(&output)
        }

        Command::Union {
            file_a,
            file_b,
            output,
            dedupe,
            no_dedupe,
            dedupe_columns,
        } => {
            println!("Unioning {} and {}...", file_a.display(), file_b.display());
            let options = UnionOptions::default()
                .with_dedupe(dedupe || !no_dedupe)
                .with_dedupe_columns(column_list(dedupe_columns.as_deref()));
            union_files(&[file_a, file_b], &output, &options, None)?;
            created(&output)
        }

        Command::UnionMultiple {
            csv_files,
            output,
            dedupe,
            dedupe_columns,
            chunksize,
            strict_columns,
        } => {
            println!("Unioning {} CSV files...", csv_files.len());
            let schema = if strict_columns {
                SchemaPolicy::Strict
            } else {
                SchemaPolicy::Lenient
            };
            let options = UnionOptions::default()
                .with_dedupe(dedupe)
                .with_dedupe_columns(column_list(dedupe_columns.as_deref()))
                .with_schema(schema);
            let rows = union_files(&csv_files, &output, &options, chunksize)?;
            println!("Wrote {} rows", rows);
            created(&output)
        }

        Command::Join {
            files,
            output,
            keys,
        } => {
            let on = parse_column_list(&keys.on);
            println!(
                "Joining {} files on {:?} ({} join)...",
                files.len(),
                on,
                keys.how
            );
            let result = join_files(&files, &on, keys.how)?;
            write_table(&result, &output, "Joined")?;
            created(&output)
        }

        Command::JoinExcelSheets {
            input_file,
            output,
            sheet_left,
            sheet_right,
            keys,
            output_sheet,
        } => {
            println!(
                "Joining sheets '{}' and '{}' from {}...",
                sheet_left,
                sheet_right,
                input_file.display()
            );
            let on = parse_column_list(&keys.on);
            let result = join_sheets(&input_file, &sheet_left, &sheet_right, &on, keys.how)?;
            write_table(&result, &output, &output_sheet)?;
            created(&output)
        }

        Command::MergeExcel {
            excel_files,
            output,
            mode,
            common_only,
        } => {
            println!(
                "Merging {} Excel files in '{}' mode...",
                excel_files.len(),
                mode
            );
            let scope = if common_only {
                SheetScope::Common
            } else {
                SheetScope::All
            };
            let merged = merge_by_sheet_name(&excel_files, mode, scope)?;
            write_workbook(&merged, &output, &AutoWidthConfig::default())?;
            created(&output)
        }

        Command::MergeSheet {
            excel_files,
            output,
            sheet,
            mode,
        } => {
            println!(
                "Merging sheet '{}' from {} Excel files...",
                sheet,
                excel_files.len()
            );
            let merged = merge_sheet(&excel_files, &sheet, mode)?;
            let mut workbook = Workbook::new();
            workbook.insert(sheet, merged);
            write_workbook(&workbook, &output, &AutoWidthConfig::default())?;
            created(&output)
        }

        Command::Diff(args) => run_diff(args),
    }
}

fn run_diff(args: DiffArgs) -> Result<()> {
    let mut config = DiffConfig::new()
        .with_key_columns(column_list(args.key_columns.as_deref()))
        .with_ignore_whitespace(args.ignore_whitespace)
        .with_case_insensitive(args.case_insensitive)
        .with_ignore_columns(column_list(args.ignore_columns.as_deref()))
        .with_ignore_column_order(args.ignore_column_order)
        .with_show_only_diffs(args.show_only_diffs);
    if let Some(tolerance) = args.numeric_tolerance {
        config = config.with_numeric_tolerance(tolerance);
    }

    let mut read = ReadOptions::default();
    if let Some(sheet) = args.sheet {
        read = read.with_sheet(sheet);
    }
    if let Some(max_rows) = args.max_rows {
        read = read.with_max_rows(max_rows);
    }

    let result = diff_files(&args.file_a, &args.file_b, &config, &read).with_context(|| {
        format!(
            "Failed to compare {} with {}",
            args.file_a.display(),
            args.file_b.display()
        )
    })?;

    let name_a = file_label(&args.file_a);
    let name_b = file_label(&args.file_b);

    if args.stats_only {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
        return Ok(());
    }

    match args.output {
        Some(output) if is_workbook(&output) => {
            let options = ExportOptions::default()
                .with_names(name_a, name_b)
                .with_highlight(!args.no_highlight);
            export_to_workbook(&result, &output, &options)?;
            created(&output)
        }
        Some(output) => {
            write_csv(&result.to_table(), &output)?;
            created(&output)
        }
        None => {
            TerminalOutput::new()
                .with_color_choice(color_choice())
                .print(&result, &name_a, &name_b)?;
            Ok(())
        }
    }
}

fn column_list(list: Option<&str>) -> Vec<String> {
    list.map(parse_column_list).unwrap_or_default()
}

fn color_choice() -> ColorChoice {
    if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn created(path: &Path) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(stdout, "✓")?;
    stdout.reset()?;
    writeln!(stdout, " Created {}", path.display())?;
    Ok(())
}
