use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use strum::Display;

/// A coverage percentage, keeping the text the tool printed for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentage {
    value: f64,
    text: String,
}

impl Percentage {
    /// Accepts `87.50` or `87.50%`. The trailing `%` is not kept.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_end_matches('%').trim();
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.text)
    }
}

/// Coverage summary of one target, written under its own output location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerTargetReport {
    pub target: String,
    pub statement_percent: Option<Percentage>,
    /// MC/DC (clang) or multicondition (CTC++) coverage
    pub decision_percent: Option<Percentage>,
    pub text_report: PathBuf,
    pub xml_report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum SkipReason {
    NotExecutable,
    NoCoverage,
    NameCollision,
    /// The strategy has no per-target reports
    Unsupported,
}

/// Result of per-target generation. Failures stay local to the target.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Reported(PerTargetReport),
    Skipped(SkipReason),
    Failed(String),
}

impl TargetOutcome {
    pub fn report(&self) -> Option<&PerTargetReport> {
        match self {
            TargetOutcome::Reported(report) => Some(report),
            _ => None,
        }
    }
}

/// Consolidated view over every target with valid artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Targets whose artifacts went into the consolidated dataset, in catalog order
    pub targets: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

/// Per-run tallies printed at the end of the per-target phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub reported: usize,
    pub skipped: usize,
    pub collisions: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a TargetOutcome>) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome {
                TargetOutcome::Reported(_) => counts.reported += 1,
                TargetOutcome::Skipped(SkipReason::NameCollision) => counts.collisions += 1,
                TargetOutcome::Skipped(_) => counts.skipped += 1,
                TargetOutcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }
}
