use crate::types::Percentage;

/// Line and MC/DC coverage from the `TOTAL` row of `llvm-cov report`.
///
/// The row's percentage columns are, in order: regions, functions, lines, branches and
/// (with `--show-mcdc-summary`) MC/DC. Columns without data print as `-`.
pub fn parse_total_row(report: &str) -> (Option<Percentage>, Option<Percentage>) {
    let Some(total) = report
        .lines()
        .find(|line| line.trim_start().starts_with("TOTAL"))
    else {
        return (None, None);
    };

    let percents: Vec<Option<Percentage>> = total
        .split_whitespace()
        .filter(|token| token.ends_with('%') || *token == "-")
        .map(Percentage::parse)
        .collect();

    let lines = percents.get(2).cloned().flatten();
    let mcdc = if percents.len() >= 5 {
        percents.last().cloned().flatten()
    } else {
        None
    };
    (lines, mcdc)
}
