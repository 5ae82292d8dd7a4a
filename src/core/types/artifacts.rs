use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use strum::{Display, EnumString};

use crate::types::BuildTarget;

/// Coverage instrumentation toolchain a run works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// clang source-based coverage (`.profraw` / `.profdata`, llvm-cov)
    Clang,
    /// Testwell CTC++ (`.sym` / `.dat`, ctcpost)
    Ctc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Executable,
    RawProfile,
    ProfileData,
    SummaryText,
    SymbolTable,
    ExecutionData,
}

impl Backend {
    /// Companion files named by appending a suffix to a target's primary output.
    pub fn naming_policy(&self) -> &'static [(ArtifactKind, &'static str)] {
        match self {
            Backend::Clang => &[
                (ArtifactKind::Executable, ""),
                (ArtifactKind::RawProfile, ".profraw"),
                (ArtifactKind::ProfileData, ".profdata"),
                (ArtifactKind::SummaryText, ".coverage.txt"),
            ],
            Backend::Ctc => &[
                (ArtifactKind::Executable, ""),
                (ArtifactKind::SymbolTable, ".sym"),
                (ArtifactKind::ExecutionData, ".dat"),
            ],
        }
    }

    /// The artifact whose presence shows instrumentation was active for a target.
    pub fn enabling_artifact(&self) -> ArtifactKind {
        match self {
            Backend::Clang => ArtifactKind::RawProfile,
            Backend::Ctc => ArtifactKind::SymbolTable,
        }
    }
}

/// Reports written below the log directory, or below a target's own report directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFile {
    /// Consolidated indexed profile
    ProfileData,
    SummaryText,
    SummaryXml,
    SummaryCsv,
    SummaryMarkdown,
    /// HTML view: one file for clang, a directory for CTC++
    Html,
    /// Transient `@file` argument list
    OptionList,
    /// Root of the per-target report directories
    PerTargetRoot,
    /// HTML directory inside one target's report directory (CTC++ only)
    TargetHtml,
}

impl Backend {
    /// File or directory name of `file` for this backend.
    pub fn report_name(&self, file: ReportFile) -> &'static str {
        match (self, file) {
            (_, ReportFile::ProfileData) => "coverage.profdata",
            (_, ReportFile::SummaryText) => "coverage.txt",
            (_, ReportFile::SummaryXml) => "coverage.xml",
            (_, ReportFile::SummaryCsv) => "coverage.csv",
            (_, ReportFile::SummaryMarkdown) => "coverage.md",
            (Backend::Clang, ReportFile::Html) => "coverage.html",
            (Backend::Ctc, ReportFile::Html) => "coverage",
            (_, ReportFile::OptionList) => "coverage.rsp",
            (_, ReportFile::PerTargetRoot) => "coverage_per_target",
            (_, ReportFile::TargetHtml) => "CTCHTML",
        }
    }

    pub fn report_path(&self, dir: &Path, file: ReportFile) -> PathBuf {
        dir.join(self.report_name(file))
    }
}

/// Append `suffix` to the full file name (`app` -> `app.profraw`, `app.exe` -> `app.exe.profraw`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Expected companion files of one target and which of them exist on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    pub target: String,
    pub backend: Backend,
    paths: BTreeMap<ArtifactKind, PathBuf>,
    present: BTreeSet<ArtifactKind>,
}

impl ArtifactSet {
    /// Derive the artifact names of `target` for `backend` and check which exist.
    ///
    /// Returns `None` for targets that can never carry coverage: anything other than an
    /// executable, or an entry without an output file. Only the filesystem is read.
    pub fn locate(target: &BuildTarget, backend: Backend) -> Option<Self> {
        if !target.is_executable() {
            return None;
        }
        let output = target.primary_output()?;

        let mut paths = BTreeMap::new();
        let mut present = BTreeSet::new();
        for (kind, suffix) in backend.naming_policy() {
            let path = with_suffix(output, suffix);
            if path.is_file() {
                present.insert(*kind);
            }
            paths.insert(*kind, path);
        }

        Some(Self {
            target: target.name.clone(),
            backend,
            paths,
            present,
        })
    }

    /// Path of `kind`. Every kind in the backend's naming policy has one.
    pub fn path(&self, kind: ArtifactKind) -> &Path {
        self.paths
            .get(&kind)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.present.contains(&kind)
    }

    /// Both the built binary and the enabling artifact exist.
    ///
    /// A missing binary (failed build) counts the same as never instrumented.
    pub fn is_enabled(&self) -> bool {
        self.exists(ArtifactKind::Executable) && self.exists(self.backend.enabling_artifact())
    }

    pub fn present(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.present.iter().copied()
    }

    /// Re-check a single artifact, e.g. after a tool was expected to produce it.
    pub fn refresh(&mut self, kind: ArtifactKind) -> bool {
        let exists = self.paths.get(&kind).is_some_and(|p| p.is_file());
        if exists {
            self.present.insert(kind);
        } else {
            self.present.remove(&kind);
        }
        exists
    }
}

/// Artifact sets of every target with coverage enabled, in catalog order.
pub fn enabled_artifacts(targets: &[BuildTarget], backend: Backend) -> Vec<ArtifactSet> {
    targets
        .iter()
        .filter_map(|t| ArtifactSet::locate(t, backend))
        .filter(ArtifactSet::is_enabled)
        .collect()
}
