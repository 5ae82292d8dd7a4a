use std::sync::Arc;

use clap::Parser;
use log::{debug, error, warn};

use crate::core::cli::{Args, Commands};
use crate::core::cmds;
use crate::core::dispatch::BackendRequest;
use crate::core::engine::runner::{SystemRunner, ToolRunner};
use crate::core::logging::init_logging;
use crate::core::preconditions::RunPaths;
use crate::types::config::{CliOverrides, load_config};
use crate::types::{AppError, AppResult, Backend};

/// Parse the command line, run the selected command and return the process exit status.
pub async fn run_main() -> i32 {
    let args = Args::parse();

    let cli_overrides = CliOverrides {
        config: args.config.clone(),
        log_level: args.log_level.clone(),
        log_color: args.log_color.clone(),
        jobs: args.jobs,
    };

    // Configuration first so level/color are applied to logging
    let loaded = load_config(&args.command.config_search_root(), &cli_overrides);
    let config = loaded.config;
    init_logging(&config.log());
    for warning in &loaded.warnings {
        warn!("{warning}");
    }
    debug!("Effective configuration: {config:?}");

    let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner);
    let result: AppResult<()> = match args.command {
        Commands::Clang(clang_args) => {
            let paths = RunPaths::from(clang_args.paths);
            let request = BackendRequest::Clang {
                ignore_regex: clang_args.regex,
                per_target: clang_args.per_target,
            };
            cmds::execute_coverage(&paths, request, &config, runner)
                .await
                .map(|_| ())
        }
        Commands::Ctc(ctc_args) => {
            let paths = RunPaths::from(ctc_args.paths);
            cmds::execute_coverage(&paths, BackendRequest::Ctc, &config, runner)
                .await
                .map(|_| ())
        }
        Commands::Targets(targets_args) => targets_args
            .backend
            .parse::<Backend>()
            .map_err(|_| {
                AppError::Custom(format!(
                    "Unknown backend '{}', expected clang or ctc",
                    targets_args.backend
                ))
            })
            .and_then(|backend| {
                cmds::execute_targets(&targets_args.info_dir, backend, &targets_args.format)
            }),
    };

    exit_code(result)
}

/// 0 on success, 1 after logging any fatal error.
pub fn exit_code(result: AppResult<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            1
        }
    }
}
