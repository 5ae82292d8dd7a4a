#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::sync::{Arc, Mutex};

use common::{BuildTree, RecordingRunner, test_config};
use covagg::types::{
    AggregateReport, AppError, AppResult, Backend, BuildTarget, CatalogError, PerTargetReport,
    Percentage, PreconditionError, SkipReason, TargetOutcome,
};
use covagg::{
    BackendRequest, CoverageStrategy, RunContext, execute_coverage, execute_targets,
    report_targets,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Reports every executable, fails one named target, and records what aggregation saw.
#[derive(Default)]
struct ScriptedStrategy {
    fail: Option<String>,
    seen: Mutex<Vec<String>>,
}

impl CoverageStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn has_per_target_phase(&self) -> bool {
        true
    }

    fn report_target(&self, ctx: &RunContext, target: &BuildTarget) -> TargetOutcome {
        if !target.is_executable() {
            return TargetOutcome::Skipped(SkipReason::NotExecutable);
        }
        if self.fail.as_deref() == Some(target.name.as_str()) {
            return TargetOutcome::Failed("tool crashed".to_string());
        }
        self.seen.lock().unwrap().push(target.name.clone());
        TargetOutcome::Reported(PerTargetReport {
            target: target.name.clone(),
            statement_percent: Percentage::parse("100"),
            decision_percent: None,
            text_report: ctx.log_dir.join(target.dir_name()),
            xml_report: None,
        })
    }

    fn aggregate(
        &self,
        _ctx: &RunContext,
        _targets: &[BuildTarget],
        reports: &[PerTargetReport],
    ) -> AppResult<AggregateReport> {
        Ok(AggregateReport {
            targets: reports.iter().map(|r| r.target.clone()).collect(),
            outputs: Vec::new(),
        })
    }
}

fn catalog(names: &[&str]) -> Vec<BuildTarget> {
    names
        .iter()
        .map(|name| {
            let kind = if name.starts_with("lib") {
                "shared library"
            } else {
                "executable"
            };
            serde_json::from_value(json!({
                "name": name,
                "type": kind,
                "filename": [format!("/build/{name}")],
            }))
            .unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_outcomes_keep_catalog_order_across_workers() {
    let tree = BuildTree::new();
    let strategy = Arc::new(ScriptedStrategy {
        fail: Some("t3".to_string()),
        ..Default::default()
    });
    let ctx = Arc::new(RunContext::new(
        &tree.paths.log_dir,
        Arc::new(RecordingRunner::new(&[])),
    ));
    let targets = catalog(&["t0", "libcore", "t2", "t3", "t4", "t5", "t6"]);

    let outcomes = report_targets(strategy.clone(), ctx, &targets, 3)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), targets.len());
    let reported: Vec<&str> = outcomes
        .iter()
        .filter_map(TargetOutcome::report)
        .map(|r| r.target.as_str())
        .collect();
    assert_eq!(reported, vec!["t0", "t2", "t4", "t5", "t6"]);
    assert_eq!(outcomes[1], TargetOutcome::Skipped(SkipReason::NotExecutable));
    assert!(matches!(outcomes[3], TargetOutcome::Failed(_)));
    assert_eq!(strategy.seen.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_zero_jobs_still_makes_progress() {
    let tree = BuildTree::new();
    let ctx = Arc::new(RunContext::new(
        &tree.paths.log_dir,
        Arc::new(RecordingRunner::new(&[])),
    ));
    let targets = catalog(&["a", "b"]);

    let outcomes = report_targets(Arc::new(ScriptedStrategy::default()), ctx, &targets, 0)
        .await
        .unwrap();

    assert_eq!(outcomes.iter().filter_map(TargetOutcome::report).count(), 2);
}

#[tokio::test]
async fn test_missing_build_manifest_is_unsupported_backend() {
    let tree = BuildTree::new();
    fs::remove_file(tree.paths.build_root.join(covagg::BUILD_MANIFEST)).unwrap();
    tree.write_catalog(vec![tree.executable("unit", &[".sym"])]);
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));

    let err = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(1, None),
        runner.clone(),
    )
    .await
    .unwrap_err();

    match &err {
        AppError::Precondition(PreconditionError::UnsupportedBuildBackend { backend, .. }) => {
            assert_eq!(*backend, "Testwell CTC++")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(runner.calls().is_empty());
    assert!(BuildTree::list(&tree.paths.log_dir).is_empty());
}

#[tokio::test]
async fn test_missing_log_directory_is_rejected() {
    let tree = BuildTree::new();
    fs::remove_dir(&tree.paths.log_dir).unwrap();
    let runner = Arc::new(RecordingRunner::clang());

    let err = execute_coverage(
        &tree.paths,
        BackendRequest::Clang {
            ignore_regex: String::new(),
            per_target: false,
        },
        &test_config(1, None),
        runner,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Precondition(PreconditionError::MissingDirectory { .. })
    ));
}

#[tokio::test]
async fn test_unreadable_catalog_is_fatal() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::clang());
    let request = BackendRequest::Clang {
        ignore_regex: String::new(),
        per_target: false,
    };

    let err = execute_coverage(&tree.paths, request.clone(), &test_config(1, None), runner.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Catalog(CatalogError::Unavailable { .. })
    ));

    fs::write(
        tree.paths.info_dir.join("intro-targets.json"),
        "{\"not\": \"a list\"}",
    )
    .unwrap();
    let err = execute_coverage(&tree.paths, request, &test_config(1, None), runner.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Catalog(CatalogError::Malformed { .. })));
    assert!(runner.calls().is_empty());
    assert_eq!(covagg::exit_code(Err(err)), 1);
}

#[test]
fn test_targets_listing_reads_catalog_only() {
    let tree = BuildTree::new();
    tree.write_catalog(vec![
        tree.executable("unit", &[".profraw"]),
        tree.library("core", &[]),
    ]);
    let before = BuildTree::list(&tree.paths.build_root);

    execute_targets(&tree.paths.info_dir, Backend::Clang, "json").unwrap();
    execute_targets(&tree.paths.info_dir, Backend::Ctc, "table").unwrap();

    assert_eq!(BuildTree::list(&tree.paths.build_root), before);
    assert!(BuildTree::list(&tree.paths.log_dir).is_empty());

    let err = execute_targets(&tree.paths.log_dir, Backend::Clang, "table").unwrap_err();
    assert!(matches!(
        err,
        AppError::Catalog(CatalogError::Unavailable { .. })
    ));
}
