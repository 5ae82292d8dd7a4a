pub mod clang;
pub mod ctc;

use std::fs;
use std::io;
use std::path::Path;

/// Remove an output of a previous run. A missing file is fine.
pub(crate) fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Remove an output directory of a previous run with everything below it.
pub(crate) fn remove_stale_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
