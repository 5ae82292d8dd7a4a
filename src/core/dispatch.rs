use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use regex::Regex;

use crate::backends::clang::ClangStrategy;
use crate::backends::ctc::{self, CtcGeneration, DirectReportStrategy, XmlMergeStrategy};
use crate::core::engine::runner::ToolRunner;
use crate::core::engine::traits::CoverageStrategy;
use crate::types::config::Config;
use crate::types::{Backend, PreconditionError};

/// The backend a run was asked for, with its backend-specific options.
#[derive(Debug, Clone)]
pub enum BackendRequest {
    Clang {
        /// Filename exclusion regex; empty means no filter
        ignore_regex: String,
        per_target: bool,
    },
    Ctc,
}

impl BackendRequest {
    pub fn backend(&self) -> Backend {
        match self {
            BackendRequest::Clang { .. } => Backend::Clang,
            BackendRequest::Ctc => Backend::Ctc,
        }
    }
}

/// Build the one strategy this run uses.
///
/// `Ok(None)` means the installed CTC++ version has no known strategy; nothing is aggregated.
pub fn select_strategy(
    request: &BackendRequest,
    config: &Config,
    runner: &dyn ToolRunner,
) -> Result<Option<Arc<dyn CoverageStrategy>>, PreconditionError> {
    let tools = config.tools();
    match request {
        BackendRequest::Clang {
            ignore_regex,
            per_target,
        } => {
            if !ignore_regex.is_empty() {
                Regex::new(ignore_regex).map_err(|source| PreconditionError::InvalidRegex {
                    pattern: ignore_regex.clone(),
                    source,
                })?;
            }
            let llvm_profdata = require_tool(runner, tools.llvm_profdata())?;
            let llvm_cov = require_tool(runner, tools.llvm_cov())?;
            Ok(Some(Arc::new(ClangStrategy::new(
                llvm_profdata,
                llvm_cov,
                ignore_regex,
                *per_target,
            ))))
        }
        BackendRequest::Ctc => {
            let installation = ctc::detect(runner, tools.ctc())?;
            println!("\nFound Testwell CTC++ version {}", installation.version.raw);
            info!("Using {}", installation.ctc.display());

            let ctc_config = config.ctc();
            let strategy: Arc<dyn CoverageStrategy> = match installation.version.generation() {
                CtcGeneration::XmlMerge => Arc::new(XmlMergeStrategy::new(
                    resolve_tool(runner, tools.ctcpost()),
                    resolve_tool(runner, tools.ctcxmlmerge()),
                    resolve_tool(runner, tools.perl()),
                    ctc_config.home(),
                )),
                CtcGeneration::DirectReport => Arc::new(DirectReportStrategy::new(
                    resolve_tool(runner, tools.ctcreport()),
                    ctc_config.measures(),
                )),
                CtcGeneration::Unrecognized => {
                    warn!(
                        "Unsupported Testwell CTC++ version {}, no coverage report generated",
                        installation.version.raw
                    );
                    return Ok(None);
                }
            };
            Ok(Some(strategy))
        }
    }
}

fn require_tool(runner: &dyn ToolRunner, tool: &str) -> Result<PathBuf, PreconditionError> {
    runner
        .locate(tool)
        .ok_or_else(|| PreconditionError::ToolNotFound {
            tool: tool.to_string(),
            reason: "not found on PATH".to_string(),
        })
}

/// Helper tools are looked up but not required; a failed call is a per-step warning.
fn resolve_tool(runner: &dyn ToolRunner, tool: &str) -> PathBuf {
    runner.locate(tool).unwrap_or_else(|| PathBuf::from(tool))
}
