//! Highlighted diff report workbook

use std::path::Path;

use rust_xlsxwriter::{Color, Format, Worksheet, XlsxError};
use tracing::info;

use crate::config::ExportOptions;
use crate::diff::{DiffResult, DiffStats, RowStatus};
use crate::error::Result;

use super::excel::{apply_widths, unique_sheet_name, write_cell, write_sheet, xlsx_error};
use super::persist_bytes;

/// Header background
pub const HEADER_COLOR: u32 = 0xD9D9D9;

/// Row background per status
pub const STATUS_COLORS: [(RowStatus, u32); 4] = [
    (RowStatus::Match, 0xC6EFCE),
    (RowStatus::Diff, 0xFFEB9C),
    (RowStatus::OnlyA, 0xBDD7EE),
    (RowStatus::OnlyB, 0xF8CBAD),
];

fn status_color(status: RowStatus) -> u32 {
    STATUS_COLORS
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, c)| *c)
        .unwrap_or(HEADER_COLOR)
}

/// Per-status fills, plain and bold
struct Palette {
    header: Format,
    rows: Vec<(RowStatus, Format, Format)>,
}

impl Palette {
    fn new() -> Self {
        let rows = STATUS_COLORS
            .iter()
            .map(|(status, rgb)| {
                let fill = Format::new().set_background_color(Color::RGB(*rgb));
                let bold = fill.clone().set_bold();
                (*status, fill, bold)
            })
            .collect();
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_COLOR)),
            rows,
        }
    }

    fn row(&self, status: RowStatus, emphasised: bool) -> Option<&Format> {
        self.rows
            .iter()
            .find(|(s, _, _)| *s == status)
            .map(|(_, fill, bold)| if emphasised { bold } else { fill })
    }
}

/// Write the comparison, summary and one-sided sheets to `destination`
pub fn export_to_workbook(
    result: &DiffResult,
    destination: &Path,
    options: &ExportOptions,
) -> Result<()> {
    info!("Exporting diff to Excel: {}", destination.display());

    let mut book = rust_xlsxwriter::Workbook::new();
    let mut taken: Vec<String> = Vec::new();
    let err = |e| xlsx_error(destination, e);

    for name in [
        "Comparison".to_string(),
        "Summary".to_string(),
        format!("Only in {}", options.file_a_name),
        format!("Only in {}", options.file_b_name),
    ] {
        add_sheet(&mut book, &name, &mut taken).map_err(err)?;
    }

    let comparison = book.worksheet_from_index(0).map_err(err)?;
    write_comparison(comparison, result, options).map_err(err)?;

    let summary = book.worksheet_from_index(1).map_err(err)?;
    write_summary(summary, &result.stats, options).map_err(err)?;

    for (index, status) in [(2, RowStatus::OnlyA), (3, RowStatus::OnlyB)] {
        let worksheet = book.worksheet_from_index(index).map_err(err)?;
        write_sheet(worksheet, &result.status_table(status), &options.auto_width).map_err(err)?;
    }

    let bytes = book.save_to_buffer().map_err(err)?;
    persist_bytes(destination, &bytes)?;
    info!("Exported diff to {}", destination.display());
    Ok(())
}

fn add_sheet(
    book: &mut rust_xlsxwriter::Workbook,
    name: &str,
    taken: &mut Vec<String>,
) -> std::result::Result<(), XlsxError> {
    let sheet_name = unique_sheet_name(name, taken);
    book.add_worksheet().set_name(sheet_name.as_str())?;
    taken.push(sheet_name);
    Ok(())
}

fn write_comparison(
    worksheet: &mut Worksheet,
    result: &DiffResult,
    options: &ExportOptions,
) -> std::result::Result<(), XlsxError> {
    if !options.highlight {
        return write_sheet(worksheet, &result.to_table(), &options.auto_width);
    }

    let palette = Palette::new();
    for (col, header) in result.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header.as_str(), &palette.header)?;
    }

    for (i, row) in result.rows.iter().enumerate() {
        let excel_row = i as u32 + 1;
        for (col, value) in result.flat_cells(row).iter().enumerate() {
            // Side-by-side cells start at column 2, two per compared column
            let emphasised = col >= 2 && row.is_changed((col - 2) / 2);
            let format = palette.row(row.status, emphasised);
            write_cell(worksheet, excel_row, col as u16, value, format)?;
        }
    }

    apply_widths(worksheet, &result.to_table(), &options.auto_width)
}

fn write_summary(
    worksheet: &mut Worksheet,
    stats: &DiffStats,
    options: &ExportOptions,
) -> std::result::Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let a = &options.file_a_name;
    let b = &options.file_b_name;

    worksheet.write_string_with_format(0, 0, "Comparison Summary", &bold)?;
    worksheet.write_string_with_format(2, 0, format!("File A: {}", a), &bold)?;
    worksheet.write_string_with_format(3, 0, format!("File B: {}", b), &bold)?;
    worksheet.write_string_with_format(5, 0, "Statistic", &bold)?;
    worksheet.write_string_with_format(5, 1, "Count", &bold)?;

    let counts = [
        ("Total Rows Compared".to_string(), stats.total, None),
        ("Matching Rows".to_string(), stats.matching, Some(RowStatus::Match)),
        ("Different Rows".to_string(), stats.different, Some(RowStatus::Diff)),
        (format!("Rows Only in {}", a), stats.only_a, Some(RowStatus::OnlyA)),
        (format!("Rows Only in {}", b), stats.only_b, Some(RowStatus::OnlyB)),
    ];

    let mut longest = 0;
    for (offset, (label, count, status)) in counts.iter().enumerate() {
        let row = 6 + offset as u32;
        let format = match status {
            Some(status) if options.highlight => bold
                .clone()
                .set_background_color(Color::RGB(status_color(*status))),
            _ => bold.clone(),
        };
        worksheet.write_string_with_format(row, 0, label.as_str(), &format)?;
        worksheet.write_number(row, 1, *count as f64)?;
        longest = longest.max(label.chars().count());
    }

    if options.auto_width.enabled {
        let width = (longest as f64 + options.auto_width.padding)
            .clamp(options.auto_width.min_width, options.auto_width.max_width);
        worksheet.set_column_width(0, width)?;
    }
    Ok(())
}
