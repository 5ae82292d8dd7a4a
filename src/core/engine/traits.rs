use std::path::PathBuf;
use std::sync::Arc;

use crate::core::engine::runner::ToolRunner;
use crate::types::{AggregateReport, AppResult, BuildTarget, PerTargetReport, TargetOutcome};

/// State shared by every step of one run.
pub struct RunContext {
    pub log_dir: PathBuf,
    pub runner: Arc<dyn ToolRunner>,
}

impl RunContext {
    pub fn new(log_dir: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            log_dir: log_dir.into(),
            runner,
        }
    }
}

/// One way of turning on-disk coverage artifacts into reports.
///
/// Each backend (and each incompatible generation of a backend's tools) provides one.
pub trait CoverageStrategy: Send + Sync {
    /// Short name used in log lines (e.g., "clang", "ctc-9")
    fn name(&self) -> &'static str;

    /// Reset output locations before per-target work starts.
    fn prepare(&self, _ctx: &RunContext) -> AppResult<()> {
        Ok(())
    }

    /// Whether `report_target` should run for every target before aggregation.
    fn has_per_target_phase(&self) -> bool;

    /// Build the report of a single target. Must not touch other targets' files.
    fn report_target(&self, ctx: &RunContext, target: &BuildTarget) -> TargetOutcome;

    /// Consolidate every eligible target into the aggregate outputs.
    ///
    /// `reports` holds the successful per-target reports in catalog order.
    fn aggregate(
        &self,
        ctx: &RunContext,
        targets: &[BuildTarget],
        reports: &[PerTargetReport],
    ) -> AppResult<AggregateReport>;
}
