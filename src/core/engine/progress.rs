use crate::types::{PerTargetReport, Percentage};

const NAME_WIDTH: usize = 80;

pub fn format_header() -> String {
    format!(
        "{:<NAME_WIDTH$} {:>11} {:>6}",
        "Test name", "Statement", "MC/DC"
    )
}

/// One aligned score row: `<name> <statement>% <mcdc>%`.
pub fn format_row(report: &PerTargetReport) -> String {
    format!(
        "{:<NAME_WIDTH$} {:>10}% {:>5}%",
        report.target,
        format_percent(report.statement_percent.as_ref()),
        format_percent(report.decision_percent.as_ref())
    )
}

fn format_percent(value: Option<&Percentage>) -> &str {
    value.map_or("-", Percentage::as_str)
}

/// Rows from concurrent workers may interleave; each is a single `println!`.
pub fn print_header() {
    println!();
    println!("{}", format_header());
}

pub fn print_row(report: &PerTargetReport) {
    println!("{}", format_row(report));
}
