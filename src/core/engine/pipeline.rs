use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::engine::traits::{CoverageStrategy, RunContext};
use crate::types::{AppError, AppResult, BuildTarget, OutcomeCounts, TargetOutcome};

/// Run `report_target` for every catalog entry on at most `jobs` blocking workers.
///
/// Returns once every unit has finished, with outcomes in catalog order.
pub async fn report_targets(
    strategy: Arc<dyn CoverageStrategy>,
    ctx: Arc<RunContext>,
    targets: &[BuildTarget],
    jobs: usize,
) -> AppResult<Vec<TargetOutcome>> {
    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut workers = JoinSet::new();

    for (index, target) in targets.iter().cloned().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AppError::Custom(format!("Worker pool closed: {e}")))?;
        let strategy = Arc::clone(&strategy);
        let ctx = Arc::clone(&ctx);
        workers.spawn_blocking(move || {
            let _permit = permit;
            debug!("Generating report for {}", target.name);
            (index, strategy.report_target(&ctx, &target))
        });
    }

    let mut outcomes: Vec<(usize, TargetOutcome)> = Vec::with_capacity(targets.len());
    while let Some(joined) = workers.join_next().await {
        outcomes.push(joined?);
    }
    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<TargetOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

    let counts = OutcomeCounts::tally(&outcomes);
    info!(
        "{}: {} per-target report(s), {} skipped, {} name collision(s), {} failed in {:.1}s",
        strategy.name(),
        counts.reported,
        counts.skipped,
        counts.collisions,
        counts.failed,
        started.elapsed().as_secs_f64()
    );

    Ok(outcomes)
}
