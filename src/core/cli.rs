use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::preconditions::RunPaths;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file. Defaults to the nearest covagg.toml above the build root.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (overrides config). One of: trace, debug, info, warn, error
    #[arg(long = "log.level", global = true)]
    pub log_level: Option<String>,

    /// Logging color control: "on" to force colors, "off" to disable; omit for auto
    #[arg(long = "log.color", global = true)]
    pub log_color: Option<String>,

    /// Maximum number of targets processed in parallel.
    /// Defaults to the available parallelism.
    #[arg(long, global = true)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate clang source-based (MC/DC) coverage
    Clang(ClangArgs),

    /// Aggregate Testwell CTC++ coverage
    Ctc(CtcArgs),

    /// List catalog targets and the coverage artifacts found for them
    Targets(TargetsArgs),
}

/// Positional locations shared by both coverage commands
#[derive(clap::Args, Debug)]
pub struct RunPathArgs {
    pub source_root: PathBuf,
    pub subproject_root: PathBuf,
    pub build_root: PathBuf,
    /// Directory receiving the reports
    pub log_dir: PathBuf,
    /// Directory holding intro-targets.json
    pub info_dir: PathBuf,
}

impl From<RunPathArgs> for RunPaths {
    fn from(args: RunPathArgs) -> Self {
        Self {
            source_root: args.source_root,
            subproject_root: args.subproject_root,
            build_root: args.build_root,
            log_dir: args.log_dir,
            info_dir: args.info_dir,
        }
    }
}

/// Arguments for the clang command
#[derive(Parser, Debug)]
pub struct ClangArgs {
    #[command(flatten)]
    pub paths: RunPathArgs,

    /// Filename exclusion regex passed to llvm-cov; an empty string disables filtering
    pub regex: String,

    /// Also write a summary next to every instrumented binary before aggregating
    #[arg(long)]
    pub per_target: bool,
}

/// Arguments for the ctc command
#[derive(Parser, Debug)]
pub struct CtcArgs {
    #[command(flatten)]
    pub paths: RunPathArgs,
}

/// Arguments for the targets command
#[derive(Parser, Debug)]
pub struct TargetsArgs {
    /// Directory holding intro-targets.json
    pub info_dir: PathBuf,

    /// Coverage backend whose artifacts are checked: "clang" or "ctc"
    #[arg(long, default_value = "clang")]
    pub backend: String,

    /// Output format: "table" (default) or "json"
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl Commands {
    /// Directory the config file search starts from.
    pub fn config_search_root(&self) -> PathBuf {
        match self {
            Commands::Clang(args) => args.paths.build_root.clone(),
            Commands::Ctc(args) => args.paths.build_root.clone(),
            Commands::Targets(args) => args.info_dir.clone(),
        }
    }
}
