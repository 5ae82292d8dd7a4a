use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::backends::remove_stale;
use crate::core::engine::runner::{Capture, Invocation, option_file_arg, write_option_file};
use crate::core::engine::traits::{CoverageStrategy, RunContext};
use crate::types::{
    AggregateReport, AppResult, ArtifactKind, Backend, BuildTarget, PerTargetReport, ReportFile,
    SkipReason, TargetOutcome, enabled_artifacts,
};

/// Output file and `-template` selector of each aggregate report.
pub const REPORTS: [(ReportFile, Option<&str>); 4] = [
    (ReportFile::SummaryText, None),
    (ReportFile::SummaryXml, Some("example_xml")),
    (ReportFile::SummaryCsv, Some("example_csv")),
    (ReportFile::SummaryMarkdown, Some("example_markdown")),
];

/// CTC++ 10.x: `ctcreport` reads every symbol/data file directly, once per output format.
pub struct DirectReportStrategy {
    ctcreport: PathBuf,
    measures: String,
}

impl DirectReportStrategy {
    pub fn new(ctcreport: impl Into<PathBuf>, measures: impl Into<String>) -> Self {
        Self {
            ctcreport: ctcreport.into(),
            measures: measures.into(),
        }
    }

    /// Option file contents: all `.sym` files, all `.dat` files, then the report options.
    pub fn option_tokens(
        &self,
        symbols: &[&Path],
        data: &[&Path],
        output: &Path,
        template: Option<&str>,
    ) -> Vec<OsString> {
        let mut tokens: Vec<OsString> = symbols
            .iter()
            .chain(data.iter())
            .map(|p| p.as_os_str().to_owned())
            .collect();
        tokens.extend(
            ["-measures", self.measures.as_str(), "-nsb", "-o"]
                .into_iter()
                .map(OsString::from),
        );
        tokens.push(output.as_os_str().to_owned());
        if let Some(template) = template {
            tokens.push("-template".into());
            tokens.push(template.into());
        }
        tokens
    }

    pub fn report_invocation(&self, option_file: &Path) -> Invocation {
        Invocation::new(&self.ctcreport)
            .arg(option_file_arg(option_file))
            .capture(Capture::Null)
    }
}

impl CoverageStrategy for DirectReportStrategy {
    fn name(&self) -> &'static str {
        "ctc-10"
    }

    fn has_per_target_phase(&self) -> bool {
        false
    }

    fn report_target(&self, _ctx: &RunContext, _target: &BuildTarget) -> TargetOutcome {
        TargetOutcome::Skipped(SkipReason::Unsupported)
    }

    fn aggregate(
        &self,
        ctx: &RunContext,
        targets: &[BuildTarget],
        _reports: &[PerTargetReport],
    ) -> AppResult<AggregateReport> {
        let outputs: Vec<PathBuf> = REPORTS
            .iter()
            .map(|(file, _)| Backend::Ctc.report_path(&ctx.log_dir, *file))
            .collect();
        for output in &outputs {
            remove_stale(output)?;
        }

        let inputs = enabled_artifacts(targets, Backend::Ctc);
        if inputs.is_empty() {
            info!("No targets with CTC++ symbol files, writing empty summary");
            fs::write(&outputs[0], "")?;
            return Ok(AggregateReport {
                targets: Vec::new(),
                outputs: vec![outputs[0].clone()],
            });
        }

        let symbols: Vec<&Path> = inputs
            .iter()
            .map(|a| a.path(ArtifactKind::SymbolTable))
            .collect();
        let data: Vec<&Path> = inputs
            .iter()
            .filter(|a| a.exists(ArtifactKind::ExecutionData))
            .map(|a| a.path(ArtifactKind::ExecutionData))
            .collect();

        let option_file = Backend::Ctc.report_path(&ctx.log_dir, ReportFile::OptionList);
        for ((_, template), output) in REPORTS.iter().zip(&outputs) {
            let tokens = self.option_tokens(&symbols, &data, output, *template);
            write_option_file(&option_file, &tokens)?;
            ctx.runner
                .run_logged(&self.report_invocation(&option_file));
        }
        fs::remove_file(&option_file)?;

        Ok(AggregateReport {
            targets: inputs.iter().map(|a| a.target.clone()).collect(),
            outputs,
        })
    }
}
