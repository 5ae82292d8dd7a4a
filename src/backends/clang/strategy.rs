use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::backends::remove_stale;
use crate::core::engine::progress;
use crate::core::engine::runner::{Capture, Invocation};
use crate::core::engine::traits::{CoverageStrategy, RunContext};
use crate::types::{
    AggregateReport, AppResult, ArtifactKind, ArtifactSet, Backend, BuildTarget, PerTargetReport,
    ReportFile, SkipReason, TargetOutcome, enabled_artifacts,
};

use super::summary::parse_total_row;

/// clang source-based coverage through `llvm-profdata` and `llvm-cov`.
pub struct ClangStrategy {
    llvm_profdata: PathBuf,
    llvm_cov: PathBuf,
    ignore_regex: Option<String>,
    per_target: bool,
}

impl ClangStrategy {
    /// `ignore_regex` is applied to every `llvm-cov` call when non-empty.
    pub fn new(
        llvm_profdata: impl Into<PathBuf>,
        llvm_cov: impl Into<PathBuf>,
        ignore_regex: &str,
        per_target: bool,
    ) -> Self {
        Self {
            llvm_profdata: llvm_profdata.into(),
            llvm_cov: llvm_cov.into(),
            ignore_regex: (!ignore_regex.is_empty()).then(|| ignore_regex.to_string()),
            per_target,
        }
    }

    fn with_ignore_regex(&self, invocation: Invocation) -> Invocation {
        match &self.ignore_regex {
            Some(regex) => invocation.arg(format!("--ignore-filename-regex={regex}")),
            None => invocation,
        }
    }

    fn instr_profile(profdata: &Path) -> String {
        format!("-instr-profile={}", profdata.display())
    }

    /// Index one target's raw profile.
    pub fn target_merge_invocation(&self, raw_profile: &Path, profdata: &Path) -> Invocation {
        Invocation::new(&self.llvm_profdata)
            .args(["merge", "-sparse"])
            .arg(raw_profile)
            .arg("-o")
            .arg(profdata)
    }

    /// Summary of one target's binary, written to `summary`.
    pub fn target_report_invocation(
        &self,
        executable: &Path,
        profdata: &Path,
        summary: &Path,
    ) -> Invocation {
        let invocation = Invocation::new(&self.llvm_cov)
            .arg("report")
            .arg("-object")
            .arg(executable)
            .arg(Self::instr_profile(profdata))
            .args(["--show-mcdc-summary", "--summary-only"])
            .capture(Capture::File(summary.to_path_buf()));
        self.with_ignore_regex(invocation)
    }

    /// Merge every raw profile into one indexed profile.
    pub fn merge_invocation(&self, raw_profiles: &[&Path], output: &Path) -> Invocation {
        Invocation::new(&self.llvm_profdata)
            .args(["merge", "-sparse", "-o"])
            .arg(output)
            .args(raw_profiles)
    }

    pub fn report_invocation(&self, objects: &[&Path], profdata: &Path, output: &Path) -> Invocation {
        let mut invocation = Invocation::new(&self.llvm_cov)
            .args(["report", "--show-mcdc-summary", "--summary-only"])
            .arg(Self::instr_profile(profdata));
        for object in objects {
            invocation = invocation.arg("-object").arg(object);
        }
        self.with_ignore_regex(invocation)
            .capture(Capture::File(output.to_path_buf()))
    }

    pub fn show_invocation(&self, objects: &[&Path], profdata: &Path, output: &Path) -> Invocation {
        let mut invocation = Invocation::new(&self.llvm_cov)
            .args([
                "show",
                "--show-mcdc",
                "--show-branches=count",
                "--format",
                "html",
            ])
            .arg(Self::instr_profile(profdata));
        for object in objects {
            invocation = invocation.arg("-object").arg(object);
        }
        self.with_ignore_regex(invocation)
            .capture(Capture::File(output.to_path_buf()))
    }
}

impl CoverageStrategy for ClangStrategy {
    fn name(&self) -> &'static str {
        "clang"
    }

    fn prepare(&self, _ctx: &RunContext) -> AppResult<()> {
        if self.per_target {
            progress::print_header();
        }
        Ok(())
    }

    fn has_per_target_phase(&self) -> bool {
        self.per_target
    }

    fn report_target(&self, ctx: &RunContext, target: &BuildTarget) -> TargetOutcome {
        let Some(mut artifacts) = ArtifactSet::locate(target, Backend::Clang) else {
            return TargetOutcome::Skipped(SkipReason::NotExecutable);
        };
        if !artifacts.is_enabled() {
            return TargetOutcome::Skipped(SkipReason::NoCoverage);
        }

        let profdata = artifacts.path(ArtifactKind::ProfileData).to_path_buf();
        if !artifacts.exists(ArtifactKind::ProfileData) {
            let merge = self
                .target_merge_invocation(artifacts.path(ArtifactKind::RawProfile), &profdata);
            ctx.runner.run_logged(&merge);
            if !artifacts.refresh(ArtifactKind::ProfileData) {
                warn!("No indexed profile produced for {}", target.name);
                return TargetOutcome::Failed(format!("{} was not created", profdata.display()));
            }
        }

        let summary = artifacts.path(ArtifactKind::SummaryText).to_path_buf();
        let report = self.target_report_invocation(
            artifacts.path(ArtifactKind::Executable),
            &profdata,
            &summary,
        );
        ctx.runner.run_logged(&report);

        let text = match fs::read_to_string(&summary) {
            Ok(text) => text,
            Err(e) => {
                warn!("No coverage summary for {}: {e}", target.name);
                return TargetOutcome::Failed(e.to_string());
            }
        };
        let (statement_percent, decision_percent) = parse_total_row(&text);
        let report = PerTargetReport {
            target: target.name.clone(),
            statement_percent,
            decision_percent,
            text_report: summary,
            xml_report: None,
        };
        progress::print_row(&report);
        TargetOutcome::Reported(report)
    }

    fn aggregate(
        &self,
        ctx: &RunContext,
        targets: &[BuildTarget],
        _reports: &[PerTargetReport],
    ) -> AppResult<AggregateReport> {
        let profdata = Backend::Clang.report_path(&ctx.log_dir, ReportFile::ProfileData);
        let summary = Backend::Clang.report_path(&ctx.log_dir, ReportFile::SummaryText);
        let html = Backend::Clang.report_path(&ctx.log_dir, ReportFile::Html);

        let inputs = enabled_artifacts(targets, Backend::Clang);
        if inputs.is_empty() {
            info!("No targets with clang coverage data, writing empty summary");
            fs::write(&summary, "")?;
            fs::write(&html, "")?;
            return Ok(AggregateReport {
                targets: Vec::new(),
                outputs: vec![summary, html],
            });
        }

        let raw_profiles: Vec<&Path> = inputs
            .iter()
            .map(|a| a.path(ArtifactKind::RawProfile))
            .collect();
        let objects: Vec<&Path> = inputs
            .iter()
            .map(|a| a.path(ArtifactKind::Executable))
            .collect();

        remove_stale(&profdata)?;
        ctx.runner
            .run_logged(&self.merge_invocation(&raw_profiles, &profdata));
        ctx.runner
            .run_logged(&self.report_invocation(&objects, &profdata, &summary));
        ctx.runner
            .run_logged(&self.show_invocation(&objects, &profdata, &html));

        Ok(AggregateReport {
            targets: inputs.iter().map(|a| a.target.clone()).collect(),
            outputs: vec![profdata, summary, html],
        })
    }
}
