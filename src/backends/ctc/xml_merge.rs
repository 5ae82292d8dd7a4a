use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::backends::{remove_stale, remove_stale_dir};
use crate::core::engine::progress;
use crate::core::engine::runner::{Capture, Invocation, option_file_arg, write_option_file};
use crate::core::engine::traits::{CoverageStrategy, RunContext};
use crate::types::{
    AggregateReport, AppResult, ArtifactKind, ArtifactSet, Backend, BuildTarget, PerTargetReport,
    ReportFile, SkipReason, TargetOutcome,
};

use super::html_invocation;
use super::summary::read_summary;

/// CTC++ 9.x: `ctcpost` per target, then `ctcxmlmerge` over the per-target XML reports.
pub struct XmlMergeStrategy {
    ctcpost: PathBuf,
    ctcxmlmerge: PathBuf,
    perl: PathBuf,
    ctc_home: Option<PathBuf>,
}

impl XmlMergeStrategy {
    pub fn new(
        ctcpost: impl Into<PathBuf>,
        ctcxmlmerge: impl Into<PathBuf>,
        perl: impl Into<PathBuf>,
        ctc_home: Option<PathBuf>,
    ) -> Self {
        Self {
            ctcpost: ctcpost.into(),
            ctcxmlmerge: ctcxmlmerge.into(),
            perl: perl.into(),
            ctc_home,
        }
    }

    pub fn per_target_root(log_dir: &Path) -> PathBuf {
        Backend::Ctc.report_path(log_dir, ReportFile::PerTargetRoot)
    }

    /// `ctcpost <sym> [<dat>] -x <xml> -p <txt>`.
    ///
    /// A target that never ran has no `.dat`; the symbol file alone yields a 0% report.
    pub fn ctcpost_invocation(&self, artifacts: &ArtifactSet, xml: &Path, txt: &Path) -> Invocation {
        let mut invocation =
            Invocation::new(&self.ctcpost).arg(artifacts.path(ArtifactKind::SymbolTable));
        if artifacts.exists(ArtifactKind::ExecutionData) {
            invocation = invocation.arg(artifacts.path(ArtifactKind::ExecutionData));
        }
        invocation
            .arg("-x")
            .arg(xml)
            .arg("-p")
            .arg(txt)
            .capture(Capture::Null)
    }

    pub fn xmlmerge_invocation(&self, option_file: &Path, txt: &Path, xml: &Path) -> Invocation {
        Invocation::new(&self.ctcxmlmerge)
            .arg(option_file_arg(option_file))
            .arg("-p")
            .arg(txt)
            .arg("-x")
            .arg(xml)
    }
}

impl CoverageStrategy for XmlMergeStrategy {
    fn name(&self) -> &'static str {
        "ctc-9"
    }

    /// Delete and recreate the per-target tree.
    fn prepare(&self, ctx: &RunContext) -> AppResult<()> {
        let root = Self::per_target_root(&ctx.log_dir);
        remove_stale_dir(&root)?;
        fs::create_dir(&root)?;

        if self.ctc_home.is_none() {
            warn!("CTCHOME is not set, HTML reports will not be generated");
        }
        progress::print_header();
        Ok(())
    }

    fn has_per_target_phase(&self) -> bool {
        true
    }

    fn report_target(&self, ctx: &RunContext, target: &BuildTarget) -> TargetOutcome {
        let Some(artifacts) = ArtifactSet::locate(target, Backend::Ctc) else {
            return TargetOutcome::Skipped(SkipReason::NotExecutable);
        };
        if !artifacts.is_enabled() {
            return TargetOutcome::Skipped(SkipReason::NoCoverage);
        }

        // create_dir is the atomic claim on the name
        let result_dir = Self::per_target_root(&ctx.log_dir).join(target.dir_name());
        match fs::create_dir(&result_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    "Identical names used for targets: {}, result won't be generated",
                    target.name
                );
                return TargetOutcome::Skipped(SkipReason::NameCollision);
            }
            Err(e) => {
                warn!("Cannot create {}: {e}", result_dir.display());
                return TargetOutcome::Failed(e.to_string());
            }
        }

        let txt = Backend::Ctc.report_path(&result_dir, ReportFile::SummaryText);
        let xml = Backend::Ctc.report_path(&result_dir, ReportFile::SummaryXml);
        ctx.runner
            .run_logged(&self.ctcpost_invocation(&artifacts, &xml, &txt));

        let summary = match read_summary(&xml) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("No coverage summary for {}: {e}", target.name);
                return TargetOutcome::Failed(e.to_string());
            }
        };

        let report = PerTargetReport {
            target: target.name.clone(),
            statement_percent: Some(summary.statement),
            decision_percent: Some(summary.multicondition),
            text_report: txt,
            xml_report: Some(xml),
        };
        progress::print_row(&report);

        if let Some(html) = html_invocation(
            &self.perl,
            self.ctc_home.as_deref(),
            &report.text_report,
            &Backend::Ctc.report_path(&result_dir, ReportFile::TargetHtml),
        ) {
            ctx.runner.run_logged(&html.capture(Capture::Null));
        }

        TargetOutcome::Reported(report)
    }

    fn aggregate(
        &self,
        ctx: &RunContext,
        _targets: &[BuildTarget],
        reports: &[PerTargetReport],
    ) -> AppResult<AggregateReport> {
        let txt = Backend::Ctc.report_path(&ctx.log_dir, ReportFile::SummaryText);
        let xml = Backend::Ctc.report_path(&ctx.log_dir, ReportFile::SummaryXml);
        let html_dir = Backend::Ctc.report_path(&ctx.log_dir, ReportFile::Html);
        remove_stale(&txt)?;
        remove_stale(&xml)?;
        remove_stale_dir(&html_dir)?;

        let xml_files: Vec<OsString> = reports
            .iter()
            .filter_map(|r| r.xml_report.as_ref())
            .map(|p| p.as_os_str().to_owned())
            .collect();
        if xml_files.is_empty() {
            info!("No per-target CTC++ reports, writing empty summary");
            fs::write(&txt, "")?;
            return Ok(AggregateReport {
                targets: Vec::new(),
                outputs: vec![txt],
            });
        }

        let option_file = Backend::Ctc.report_path(&ctx.log_dir, ReportFile::OptionList);
        write_option_file(&option_file, &xml_files)?;
        ctx.runner
            .run_logged(&self.xmlmerge_invocation(&option_file, &txt, &xml));
        fs::remove_file(&option_file)?;

        if let Some(html) = html_invocation(&self.perl, self.ctc_home.as_deref(), &txt, &html_dir) {
            ctx.runner.run_logged(&html);
        }

        Ok(AggregateReport {
            targets: reports.iter().map(|r| r.target.clone()).collect(),
            outputs: vec![txt, xml, html_dir],
        })
    }
}
