use std::path::PathBuf;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::core::engine::runner::{Capture, Invocation, ToolRunner};
use crate::types::PreconditionError;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtcVersion {
    pub raw: String,
    pub major: u32,
}

/// Incompatible generations of the CTC++ reporting tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtcGeneration {
    /// 9.x: per-target `ctcpost` reports merged with `ctcxmlmerge`
    XmlMerge,
    /// 10.x: one `ctcreport` pass over all symbol/data files
    DirectReport,
    Unrecognized,
}

impl CtcVersion {
    /// First `major.minor[.patch]` found in the tool's banner.
    pub fn parse(banner: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(banner)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        Some(Self {
            raw: caps.get(0)?.as_str().to_string(),
            major,
        })
    }

    pub fn generation(&self) -> CtcGeneration {
        match self.major {
            9 => CtcGeneration::XmlMerge,
            10 => CtcGeneration::DirectReport,
            _ => CtcGeneration::Unrecognized,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CtcInstallation {
    pub ctc: PathBuf,
    pub version: CtcVersion,
}

/// Locate `ctc` and read its version.
pub fn detect(runner: &dyn ToolRunner, ctc: &str) -> Result<CtcInstallation, PreconditionError> {
    let path = runner
        .locate(ctc)
        .ok_or_else(|| PreconditionError::ToolNotFound {
            tool: ctc.to_string(),
            reason: "not found on PATH".to_string(),
        })?;

    let version_query = Invocation::new(&path)
        .arg("--version")
        .capture(Capture::Pipe);
    debug!("Querying CTC++ version: {version_query}");
    let output = runner
        .run(&version_query)
        .map_err(|e| PreconditionError::ToolNotFound {
            tool: ctc.to_string(),
            reason: format!("failed to run {}: {e}", path.display()),
        })?;

    let version = CtcVersion::parse(&output.stdout).ok_or_else(|| {
        PreconditionError::ToolNotFound {
            tool: ctc.to_string(),
            reason: format!("no version in output of {}", path.display()),
        }
    })?;

    Ok(CtcInstallation { ctc: path, version })
}
