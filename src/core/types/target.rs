use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::CatalogError;

/// Name of the build-introspection document inside the info directory.
pub const CATALOG_FILENAME: &str = "intro-targets.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Executable,
    #[serde(other)]
    Other,
}

/// One entry of the build-system target catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildTarget {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    #[serde(rename = "filename", default)]
    pub outputs: Vec<PathBuf>,
}

impl BuildTarget {
    pub fn new(name: impl Into<String>, kind: TargetKind, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            outputs: vec![output.into()],
        }
    }

    pub fn is_executable(&self) -> bool {
        self.kind == TargetKind::Executable
    }

    /// First listed output file; companion coverage artifacts are named after it.
    pub fn primary_output(&self) -> Option<&Path> {
        self.outputs.first().map(PathBuf::as_path)
    }

    /// Directory name used for this target's per-target report.
    ///
    /// Path separators are replaced so every target stays one level below the report root.
    pub fn dir_name(&self) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        match name.as_str() {
            "" | "." | ".." => format!("_{name}"),
            _ => name,
        }
    }

    /// Load the ordered target list from `<info_dir>/intro-targets.json`.
    ///
    /// No filtering happens here; consumers skip non-executable targets themselves.
    pub fn load_catalog(info_dir: &Path) -> Result<Vec<BuildTarget>, CatalogError> {
        let path = info_dir.join(CATALOG_FILENAME);
        let contents = fs::read_to_string(&path).map_err(|source| CatalogError::Unavailable {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CatalogError::Malformed { path, source })
    }
}
