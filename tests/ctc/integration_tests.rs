#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::sync::Arc;

use common::{BuildTree, RecordingRunner, test_config};
use covagg::backends::ctc::XmlMergeStrategy;
use covagg::types::{
    AppError, BuildTarget, Percentage, PreconditionError, SkipReason, TargetKind, TargetOutcome,
};
use covagg::{BackendRequest, CoverageStrategy, RunContext, execute_coverage, report_targets};
use pretty_assertions::assert_eq;
use serde_json::json;

fn xml_merge(tree: &BuildTree) -> XmlMergeStrategy {
    XmlMergeStrategy::new(
        "ctcpost",
        "ctcxmlmerge",
        "perl",
        Some(tree.dir.path().join("ctchome")),
    )
}

#[tokio::test]
async fn test_two_targets_feed_exactly_two_xml_reports_into_merge() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    tree.write_catalog(vec![
        tree.executable("alpha", &[".sym", ".dat"]),
        tree.library("core", &[".sym", ".dat"]),
        tree.executable("beta", &[".sym", ".dat"]),
    ]);

    let aggregate = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(2, Some(tree.dir.path())),
        runner.clone(),
    )
    .await
    .unwrap()
    .expect("version 9 has a strategy");

    assert_eq!(aggregate.targets, vec!["alpha", "beta"]);
    assert_eq!(runner.calls_to("ctcpost").len(), 2);
    assert_eq!(runner.calls_to("ctcxmlmerge").len(), 1);

    let option_files = runner.option_files();
    assert_eq!(option_files.len(), 1);
    let merged: Vec<&str> = option_files[0].split(' ').collect();
    let per_target = tree.log_path("coverage_per_target");
    assert_eq!(
        merged,
        vec![
            per_target.join("alpha/coverage.xml").to_str().unwrap(),
            per_target.join("beta/coverage.xml").to_str().unwrap(),
        ]
    );

    assert_eq!(BuildTree::list(&per_target), vec!["alpha", "beta"]);
    assert!(tree.log_path("coverage.txt").is_file());
    assert!(tree.log_path("coverage.xml").is_file());
    assert!(tree.log_path("coverage/index.html").is_file());
    assert!(per_target.join("alpha/CTCHTML/index.html").is_file());
    assert!(!tree.log_path("coverage.rsp").exists());
}

#[test]
fn test_symbol_table_without_execution_data() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let ctx = RunContext::new(&tree.paths.log_dir, runner.clone());
    let strategy = xml_merge(&tree);
    strategy.prepare(&ctx).unwrap();

    tree.executable("never_run", &[".sym"]);
    let target = BuildTarget::new("never_run", TargetKind::Executable, tree.output("never_run"));

    let outcome = strategy.report_target(&ctx, &target);
    let report = outcome.report().expect("target should be reported");

    let calls = runner.calls_to("ctcpost");
    assert_eq!(calls.len(), 1);
    let args = calls[0].arg_strings();
    assert_eq!(args[0], tree.output("never_run.sym").to_string_lossy());
    assert_eq!(args[1], "-x");
    assert!(!args.iter().any(|a| a.ends_with(".dat")));

    assert_eq!(report.statement_percent.as_ref().map(Percentage::as_str), Some("0"));
    assert_eq!(report.decision_percent.as_ref().map(Percentage::as_str), Some("0"));
}

#[test]
fn test_summary_percentages_reach_report() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let ctx = RunContext::new(&tree.paths.log_dir, runner.clone());
    let strategy = xml_merge(&tree);
    strategy.prepare(&ctx).unwrap();

    tree.executable("unit", &[".sym", ".dat"]);
    let target = BuildTarget::new("unit", TargetKind::Executable, tree.output("unit"));
    let report = strategy
        .report_target(&ctx, &target)
        .report()
        .cloned()
        .expect("target should be reported");

    assert_eq!(report.statement_percent.as_ref().map(Percentage::as_str), Some("75"));
    assert_eq!(report.decision_percent.as_ref().map(Percentage::as_str), Some("50"));
    assert_eq!(report.statement_percent.map(|p| p.value()), Some(75.0));
    let result_dir = tree.log_path("coverage_per_target/unit");
    assert_eq!(report.text_report, result_dir.join("coverage.txt"));
    assert_eq!(report.xml_report, Some(result_dir.join("coverage.xml")));
    assert_eq!(runner.calls_to("perl").len(), 1);
}

#[test]
fn test_name_collision_skips_second_target() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let ctx = RunContext::new(&tree.paths.log_dir, runner.clone());
    let strategy = xml_merge(&tree);
    strategy.prepare(&ctx).unwrap();

    fs::create_dir_all(tree.output("tests")).unwrap();
    tree.executable("tests/parser", &[".sym", ".dat"]);
    tree.executable("tests_parser", &[".sym", ".dat"]);
    let nested = BuildTarget::new(
        "tests/parser",
        TargetKind::Executable,
        tree.output("tests/parser"),
    );
    let flat = BuildTarget::new("tests_parser", TargetKind::Executable, tree.output("tests_parser"));

    assert!(matches!(
        strategy.report_target(&ctx, &nested),
        TargetOutcome::Reported(_)
    ));
    assert_eq!(
        strategy.report_target(&ctx, &flat),
        TargetOutcome::Skipped(SkipReason::NameCollision)
    );
    assert_eq!(runner.calls_to("ctcpost").len(), 1);
    assert_eq!(
        BuildTree::list(&tree.log_path("coverage_per_target")),
        vec!["tests_parser"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identical_names_across_workers_report_once() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let ctx = RunContext::new(&tree.paths.log_dir, runner.clone());
    let strategy = xml_merge(&tree);
    strategy.prepare(&ctx).unwrap();

    tree.executable("unit", &[".sym", ".dat"]);
    let target = BuildTarget::new("unit", TargetKind::Executable, tree.output("unit"));
    let targets = vec![target.clone(), target.clone(), target];

    let outcomes = report_targets(Arc::new(strategy), Arc::new(ctx), &targets, 4)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter_map(TargetOutcome::report).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == TargetOutcome::Skipped(SkipReason::NameCollision))
            .count(),
        2
    );
    assert_eq!(runner.calls_to("ctcpost").len(), 1);
    assert_eq!(
        BuildTree::list(&tree.log_path("coverage_per_target")),
        vec!["unit"]
    );
}

#[test]
fn test_unreadable_summary_fails_only_that_target() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let ctx = RunContext::new(&tree.paths.log_dir, runner.clone());
    let strategy = xml_merge(&tree);
    strategy.prepare(&ctx).unwrap();

    tree.executable("broken", &[".sym", ".dat"]);
    tree.executable("healthy", &[".sym", ".dat"]);
    let broken = BuildTarget::new("broken", TargetKind::Executable, tree.output("broken"));
    let healthy = BuildTarget::new("healthy", TargetKind::Executable, tree.output("healthy"));

    assert!(matches!(
        strategy.report_target(&ctx, &broken),
        TargetOutcome::Failed(_)
    ));
    assert!(matches!(
        strategy.report_target(&ctx, &healthy),
        TargetOutcome::Reported(_)
    ));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let tree = BuildTree::new();
    tree.write_catalog(vec![
        tree.executable("alpha", &[".sym", ".dat"]),
        tree.executable("beta", &[".sym"]),
    ]);
    let config = test_config(2, Some(tree.dir.path()));

    execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &config,
        Arc::new(RecordingRunner::ctc("9.1.2")),
    )
    .await
    .unwrap();
    let first_txt = fs::read(tree.log_path("coverage.txt")).unwrap();
    let first_xml = fs::read(tree.log_path("coverage.xml")).unwrap();
    // leftover from an earlier layout must not survive
    fs::write(tree.log_path("coverage_per_target/stale.txt"), "old").unwrap();

    execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &config,
        Arc::new(RecordingRunner::ctc("9.1.2")),
    )
    .await
    .unwrap();

    assert_eq!(fs::read(tree.log_path("coverage.txt")).unwrap(), first_txt);
    assert_eq!(fs::read(tree.log_path("coverage.xml")).unwrap(), first_xml);
    assert_eq!(
        BuildTree::list(&tree.log_path("coverage_per_target")),
        vec!["alpha", "beta"]
    );
}

#[tokio::test]
async fn test_aggregate_html_of_previous_run_is_removed() {
    let tree = BuildTree::new();
    tree.write_catalog(vec![tree.executable("alpha", &[".sym", ".dat"])]);
    let config = test_config(1, Some(tree.dir.path()));

    execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &config,
        Arc::new(RecordingRunner::ctc("9.1.2")),
    )
    .await
    .unwrap();
    assert!(tree.log_path("coverage/index.html").is_file());

    // instrumentation dropped: the next run has nothing to merge
    fs::remove_file(tree.output("alpha.sym")).unwrap();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    let aggregate = execute_coverage(&tree.paths, BackendRequest::Ctc, &config, runner.clone())
        .await
        .unwrap()
        .unwrap();

    assert!(aggregate.targets.is_empty());
    assert!(runner.calls_to("perl").is_empty());
    assert!(!tree.log_path("coverage").exists());
    assert!(!tree.log_path("coverage.xml").exists());
    assert_eq!(fs::read_to_string(tree.log_path("coverage.txt")).unwrap(), "");
}

#[tokio::test]
async fn test_no_enabled_targets_writes_empty_summary() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("9.1.2"));
    tree.write_catalog(vec![
        tree.executable("plain", &[]),
        tree.library("core", &[".sym"]),
    ]);

    let aggregate = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(1, None),
        runner.clone(),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(aggregate.targets.is_empty());
    assert!(runner.calls_to("ctcpost").is_empty());
    assert!(runner.calls_to("ctcxmlmerge").is_empty());
    assert_eq!(fs::read_to_string(tree.log_path("coverage.txt")).unwrap(), "");
}

#[tokio::test]
async fn test_version_10_runs_one_report_per_format() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("10.0.1"));
    tree.write_catalog(vec![
        tree.executable("alpha", &[".sym", ".dat"]),
        tree.executable("beta", &[".sym"]),
        json!({"name": "gen", "type": "custom"}),
    ]);

    let aggregate = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(2, None),
        runner.clone(),
    )
    .await
    .unwrap()
    .expect("version 10 has a strategy");

    assert_eq!(aggregate.targets, vec!["alpha", "beta"]);
    assert!(runner.calls_to("ctcpost").is_empty());
    assert_eq!(runner.calls_to("ctcreport").len(), 4);

    let option_files = runner.option_files();
    assert_eq!(option_files.len(), 4);
    let alpha_sym = tree.output("alpha.sym").display().to_string();
    let beta_sym = tree.output("beta.sym").display().to_string();
    let alpha_dat = tree.output("alpha.dat").display().to_string();
    for contents in &option_files {
        let tokens: Vec<&str> = contents.split(' ').collect();
        assert_eq!(
            tokens[..3].to_vec(),
            vec![alpha_sym.as_str(), beta_sym.as_str(), alpha_dat.as_str()]
        );
        assert_eq!(tokens[3..6].to_vec(), vec!["-measures", "mcdc,m,c,d,s,f", "-nsb"]);
    }
    assert!(!option_files[0].contains("-template"));
    assert!(option_files[1].ends_with("-template example_xml"));
    assert!(option_files[2].ends_with("-template example_csv"));
    assert!(option_files[3].ends_with("-template example_markdown"));

    for file in ["coverage.txt", "coverage.xml", "coverage.csv", "coverage.md"] {
        assert!(tree.log_path(file).is_file(), "{file} should be written");
    }
    assert!(!tree.log_path("coverage.rsp").exists());
    assert!(!tree.log_path("coverage_per_target").exists());
}

#[tokio::test]
async fn test_unrecognized_version_generates_nothing() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::ctc("8.2"));
    tree.write_catalog(vec![tree.executable("alpha", &[".sym", ".dat"])]);

    let result = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(1, None),
        runner.clone(),
    )
    .await
    .unwrap();

    assert!(result.is_none());
    assert_eq!(runner.calls_to("ctc").len(), 1);
    assert!(runner.calls_to("ctcpost").is_empty());
    assert!(BuildTree::list(&tree.paths.log_dir).is_empty());
}

#[tokio::test]
async fn test_missing_ctc_exits_with_failure_and_no_output() {
    let tree = BuildTree::new();
    let runner = Arc::new(RecordingRunner::new(&["ctcpost", "ctcxmlmerge"]));
    tree.write_catalog(vec![tree.executable("alpha", &[".sym", ".dat"])]);

    let err = execute_coverage(
        &tree.paths,
        BackendRequest::Ctc,
        &test_config(1, None),
        runner.clone(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Precondition(PreconditionError::ToolNotFound { .. })
    ));
    assert!(runner.calls().is_empty());
    assert!(BuildTree::list(&tree.paths.log_dir).is_empty());
    assert_eq!(covagg::exit_code(Err(err)), 1);
}
