use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

/// Where the standard output of an external tool goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Inherit,
    /// stdout and stderr both discarded
    Null,
    /// stdout written to this file, stderr inherited
    File(PathBuf),
    /// stdout and stderr collected into `ToolOutput::stdout`
    Pipe,
}

/// A fully specified external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdout: Capture,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: Capture::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.stdout = capture;
        self
    }

    /// Arguments as lossy strings, for assertions and log lines.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// File name of the program without directories.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: Option<i32>,
    /// Only filled for `Capture::Pipe`
    pub stdout: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the report pipeline and the processes it starts.
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion.
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;

    /// Resolve a program name or path to an executable file.
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        find_program(tool)
    }

    /// Run and log; failures are reported but never propagated.
    fn run_logged(&self, invocation: &Invocation) -> Option<ToolOutput> {
        debug!("Running: {invocation}");
        match self.run(invocation) {
            Ok(output) if output.success() => Some(output),
            Ok(output) => {
                match output.code {
                    Some(code) => warn!("{} exited with status {code}", invocation.program_name()),
                    None => warn!("{} was terminated by a signal", invocation.program_name()),
                }
                Some(output)
            }
            Err(e) => {
                warn!("Failed to run {}: {e}", invocation.program_name());
                None
            }
        }
    }
}

/// Runs invocations as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());

        match &invocation.stdout {
            Capture::Inherit => {}
            Capture::Null => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            Capture::File(path) => {
                cmd.stdout(Stdio::from(File::create(path)?));
            }
            Capture::Pipe => {
                let output = cmd.output()?;
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                return Ok(ToolOutput {
                    code: output.status.code(),
                    stdout: text,
                });
            }
        }

        let status = cmd.status()?;
        Ok(ToolOutput {
            code: status.code(),
            stdout: String::new(),
        })
    }
}

/// Look a program up the way a shell would: paths are checked directly, bare names on `PATH`.
pub fn find_program(tool: &str) -> Option<PathBuf> {
    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Write a response file for tools that accept `@file` arguments.
///
/// Tokens are space separated, matching what the CTC++ tools expect.
pub fn write_option_file(path: &Path, tokens: &[OsString]) -> io::Result<()> {
    let line = tokens
        .iter()
        .map(|t| t.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    fs::write(path, line)
}

/// `@<path>` argument referencing an option file.
pub fn option_file_arg(path: &Path) -> OsString {
    let mut arg = OsString::from("@");
    arg.push(path.as_os_str());
    arg
}
