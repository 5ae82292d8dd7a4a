use std::sync::Arc;

use log::{debug, info};

use crate::core::dispatch::{BackendRequest, select_strategy};
use crate::core::engine::pipeline::report_targets;
use crate::core::engine::runner::ToolRunner;
use crate::core::engine::traits::RunContext;
use crate::core::preconditions::{RunPaths, validate};
use crate::types::config::Config;
use crate::types::{AggregateReport, AppResult, BuildTarget, PerTargetReport, TargetOutcome};

/// Run one coverage backend end to end.
///
/// Returns `Ok(None)` when the installed tool version has no aggregation strategy.
/// Every `Err` is fatal for the run; per-target problems never surface here.
pub async fn execute_coverage(
    paths: &RunPaths,
    request: BackendRequest,
    config: &Config,
    runner: Arc<dyn ToolRunner>,
) -> AppResult<Option<AggregateReport>> {
    validate(paths, request.backend())?;
    debug!(
        "Source root {}, subproject root {}, build root {}",
        paths.source_root.display(),
        paths.subproject_root.display(),
        paths.build_root.display()
    );

    let Some(strategy) = select_strategy(&request, config, runner.as_ref())? else {
        return Ok(None);
    };

    let targets = BuildTarget::load_catalog(&paths.info_dir)?;
    info!(
        "Loaded {} target(s), {} executable",
        targets.len(),
        targets.iter().filter(|t| t.is_executable()).count()
    );

    let ctx = Arc::new(RunContext::new(&paths.log_dir, runner));
    strategy.prepare(&ctx)?;

    let reports: Vec<PerTargetReport> = if strategy.has_per_target_phase() {
        report_targets(
            Arc::clone(&strategy),
            Arc::clone(&ctx),
            &targets,
            config.jobs(),
        )
        .await?
        .into_iter()
        .filter_map(|outcome| match outcome {
            TargetOutcome::Reported(report) => Some(report),
            _ => None,
        })
        .collect()
    } else {
        Vec::new()
    };

    let aggregate = tokio::task::spawn_blocking(move || {
        strategy.aggregate(&ctx, &targets, &reports)
    })
    .await??;

    info!(
        "Aggregate coverage of {} target(s) written to {}",
        aggregate.targets.len(),
        paths.log_dir.display()
    );
    Ok(Some(aggregate))
}
