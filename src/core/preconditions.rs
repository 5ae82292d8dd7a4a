use std::path::PathBuf;

use crate::types::{Backend, PreconditionError};

/// Manifest written by the only supported build backend (Ninja).
pub const BUILD_MANIFEST: &str = "build.ninja";

/// Locations a coverage run works with, as given on the command line.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub source_root: PathBuf,
    pub subproject_root: PathBuf,
    pub build_root: PathBuf,
    pub log_dir: PathBuf,
    pub info_dir: PathBuf,
}

fn backend_label(backend: Backend) -> &'static str {
    match backend {
        Backend::Clang => "Clang MC/DC",
        Backend::Ctc => "Testwell CTC++",
    }
}

/// Check that the build tree can be processed at all. Nothing is written.
pub fn validate(paths: &RunPaths, backend: Backend) -> Result<(), PreconditionError> {
    let manifest = paths.build_root.join(BUILD_MANIFEST);
    if !manifest.is_file() {
        return Err(PreconditionError::UnsupportedBuildBackend {
            backend: backend_label(backend),
            manifest,
        });
    }

    for (role, dir) in [("info", &paths.info_dir), ("log", &paths.log_dir)] {
        if !dir.is_dir() {
            return Err(PreconditionError::MissingDirectory {
                role,
                path: dir.clone(),
            });
        }
    }
    Ok(())
}
