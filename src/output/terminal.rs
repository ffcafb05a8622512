//! Colored terminal output for diff results

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diff::{DiffResult, DiffStats, RowStatus};

/// Terminal output with colors
pub struct TerminalOutput {
    color_choice: ColorChoice,
    /// Rows shown in the side-by-side table; the summary always covers all rows
    row_limit: Option<usize>,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
            row_limit: None,
        }
    }

    pub fn with_color_choice(mut self, color_choice: ColorChoice) -> Self {
        self.color_choice = color_choice;
        self
    }

    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Render to stdout
    pub fn print(&self, diff: &DiffResult, name_a: &str, name_b: &str) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        self.render(diff, name_a, name_b, &mut stdout)
    }

    pub fn render(
        &self,
        diff: &DiffResult,
        name_a: &str,
        name_b: &str,
        writer: &mut dyn WriteColor,
    ) -> io::Result<()> {
        self.write_header(writer, name_a, name_b)?;
        self.write_rows(diff, writer)?;
        write_summary(&diff.stats, name_a, name_b, writer)
    }

    fn write_header(
        &self,
        writer: &mut dyn WriteColor,
        name_a: &str,
        name_b: &str,
    ) -> io::Result<()> {
        let rule = "━".repeat(64);
        writeln!(writer, "{}", rule)?;
        writeln!(writer, " csvexcel diff: {} → {}", name_a, name_b)?;
        writeln!(writer, "{}", rule)?;
        writeln!(writer)
    }

    fn write_rows(&self, diff: &DiffResult, writer: &mut dyn WriteColor) -> io::Result<()> {
        if diff.rows.is_empty() {
            writeln!(writer, "No rows to show.")?;
            return writeln!(writer);
        }

        let shown = self.row_limit.unwrap_or(usize::MAX).min(diff.rows.len());
        let mut data: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
        data.push(diff.headers());
        for row in &diff.rows[..shown] {
            data.push(
                diff.flat_cells(row)
                    .iter()
                    .map(|c| c.display().into_owned())
                    .collect(),
            );
        }

        write!(writer, "{}", build_table(&data))?;
        if shown < diff.rows.len() {
            writeln!(writer, "... {} more rows", diff.rows.len() - shown)?;
        }
        writeln!(writer)
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

fn status_color(status: RowStatus) -> Color {
    match status {
        RowStatus::Match => Color::Green,
        RowStatus::Diff => Color::Yellow,
        RowStatus::OnlyA => Color::Blue,
        RowStatus::OnlyB => Color::Red,
    }
}

/// Write the five counts, colored by status
pub fn write_summary(
    stats: &DiffStats,
    name_a: &str,
    name_b: &str,
    writer: &mut dyn WriteColor,
) -> io::Result<()> {
    writeln!(writer, "Summary:")?;
    writeln!(writer, "  Total rows compared: {}", stats.total)?;

    let lines = [
        (RowStatus::Match, "Matching rows".to_string(), stats.matching),
        (RowStatus::Diff, "Different rows".to_string(), stats.different),
        (RowStatus::OnlyA, format!("Only in {}", name_a), stats.only_a),
        (RowStatus::OnlyB, format!("Only in {}", name_b), stats.only_b),
    ];
    for (status, label, count) in lines {
        write!(writer, "  ")?;
        writer.set_color(ColorSpec::new().set_fg(Some(status_color(status))))?;
        write!(writer, "{}", label)?;
        writer.reset()?;
        writeln!(writer, ": {}", count)?;
    }
    Ok(())
}

/// Build a box-drawn table; the first row is the header
fn build_table(data: &[Vec<String>]) -> String {
    if data.is_empty() || data[0].is_empty() {
        return String::new();
    }

    let col_count = data[0].len();
    let mut col_widths: Vec<usize> = vec![0; col_count];
    for row in data {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }

    let border = |left: char, mid: char, right: char| {
        let segments: Vec<String> = col_widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(mid.to_string().as_str()), right)
    };
    let line = |row: &[String]| {
        let mut out = String::from("│");
        for (i, width) in col_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            out.push_str(&format!(" {:width$} │", cell, width = *width));
        }
        out.push('\n');
        out
    };

    let mut output = border('┌', '┬', '┐');
    output.push_str(&line(data[0].as_slice()));
    output.push_str(&border('├', '┼', '┤'));
    for row in &data[1..] {
        output.push_str(&line(row.as_slice()));
    }
    output.push_str(&border('└', '┴', '┘'));
    output
}
