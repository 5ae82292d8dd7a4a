use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "covagg.toml";

const DEFAULT_MEASURES: &str = "mcdc,m,c,d,s,f";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub color: Option<bool>, // None = auto-detect (semantic)
}

impl LogConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn color(&self) -> Option<bool> {
        self.color // None has semantic meaning (auto-detect)
    }
}

/// Program names (or paths) of the external coverage tools.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ToolsConfig {
    pub llvm_profdata: Option<String>,
    pub llvm_cov: Option<String>,
    pub ctc: Option<String>,
    pub ctcpost: Option<String>,
    pub ctcxmlmerge: Option<String>,
    pub ctcreport: Option<String>,
    pub perl: Option<String>,
}

impl ToolsConfig {
    pub fn llvm_profdata(&self) -> &str {
        self.llvm_profdata.as_deref().unwrap_or("llvm-profdata")
    }

    pub fn llvm_cov(&self) -> &str {
        self.llvm_cov.as_deref().unwrap_or("llvm-cov")
    }

    pub fn ctc(&self) -> &str {
        self.ctc.as_deref().unwrap_or("ctc")
    }

    pub fn ctcpost(&self) -> &str {
        self.ctcpost.as_deref().unwrap_or("ctcpost")
    }

    pub fn ctcxmlmerge(&self) -> &str {
        self.ctcxmlmerge.as_deref().unwrap_or("ctcxmlmerge")
    }

    pub fn ctcreport(&self) -> &str {
        self.ctcreport.as_deref().unwrap_or("ctcreport")
    }

    pub fn perl(&self) -> &str {
        self.perl.as_deref().unwrap_or("perl")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CtcConfig {
    pub home: Option<String>,
    pub measures: Option<String>,
}

impl CtcConfig {
    /// Installation directory holding `ctc2html.pl`. Falls back to `$CTCHOME`.
    pub fn home(&self) -> Option<PathBuf> {
        if let Some(home) = self.home.as_deref()
            && !home.trim().is_empty()
        {
            return Some(PathBuf::from(home));
        }
        env::var_os("CTCHOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    pub fn measures(&self) -> &str {
        self.measures.as_deref().unwrap_or(DEFAULT_MEASURES)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub jobs: Option<usize>,

    // Nested sections
    pub log: Option<LogConfig>,
    pub tools: Option<ToolsConfig>,
    pub ctc: Option<CtcConfig>,
}

impl Config {
    /// Worker pool size for per-target report generation.
    pub fn jobs(&self) -> usize {
        self.jobs.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn log(&self) -> LogConfig {
        self.log.clone().unwrap_or_default()
    }

    pub fn tools(&self) -> ToolsConfig {
        self.tools.clone().unwrap_or_default()
    }

    pub fn ctc(&self) -> CtcConfig {
        self.ctc.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_color: Option<String>, // "on" | "off"
    pub jobs: Option<usize>,
}

/// Effective configuration plus the problems met while reading the config file.
///
/// Logging is configured from the result, so warnings are handed back for the caller to
/// emit once the logger is installed.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Resolve the effective configuration: defaults, then the config file, then CLI overrides.
///
/// An explicit `--config` path wins; otherwise the nearest `covagg.toml` found by walking
/// up from `search_from` is used.
pub fn load_config(search_from: &Path, overrides: &CliOverrides) -> LoadedConfig {
    let mut loaded = LoadedConfig::default();

    let path = overrides
        .config
        .clone()
        .or_else(|| find_nearest_config_file(search_from));
    if let Some(path) = path {
        match read_config_file(&path) {
            Ok(file_cfg) => apply_file_config(&mut loaded.config, &file_cfg),
            Err(warning) => loaded.warnings.push(warning),
        }
    }

    apply_cli_overrides(&mut loaded.config, overrides);
    loaded
}

fn read_config_file(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Ignoring config file {}: {e}", path.display()))?;
    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Ignoring malformed config file {}: {e}", path.display()))
}

fn apply_file_config(cfg: &mut Config, file: &Config) {
    if file.jobs.is_some() {
        cfg.jobs = file.jobs;
    }

    if let Some(file_log) = &file.log {
        let mut log = cfg.log();
        if file_log.level.is_some() {
            log.level = file_log.level.clone();
        }
        if file_log.color.is_some() {
            log.color = file_log.color;
        }
        cfg.log = Some(log);
    }

    if let Some(file_tools) = &file.tools {
        let mut tools = cfg.tools();
        let pick = |file: &Option<String>, current: &mut Option<String>| {
            if let Some(v) = file.as_ref().filter(|v| !v.trim().is_empty()) {
                *current = Some(v.clone());
            }
        };
        pick(&file_tools.llvm_profdata, &mut tools.llvm_profdata);
        pick(&file_tools.llvm_cov, &mut tools.llvm_cov);
        pick(&file_tools.ctc, &mut tools.ctc);
        pick(&file_tools.ctcpost, &mut tools.ctcpost);
        pick(&file_tools.ctcxmlmerge, &mut tools.ctcxmlmerge);
        pick(&file_tools.ctcreport, &mut tools.ctcreport);
        pick(&file_tools.perl, &mut tools.perl);
        cfg.tools = Some(tools);
    }

    if let Some(file_ctc) = &file.ctc {
        let mut ctc = cfg.ctc();
        if file_ctc.home.is_some() {
            ctc.home = file_ctc.home.clone();
        }
        if file_ctc.measures.is_some() {
            ctc.measures = file_ctc.measures.clone();
        }
        cfg.ctc = Some(ctc);
    }
}

fn apply_cli_overrides(cfg: &mut Config, overrides: &CliOverrides) {
    if overrides.jobs.is_some() {
        cfg.jobs = overrides.jobs;
    }

    let mut log = cfg.log();
    if let Some(level) = &overrides.log_level
        && !level.trim().is_empty()
    {
        log.level = Some(level.trim().to_string());
    }
    if let Some(color_str) = &overrides.log_color {
        match color_str.to_lowercase().as_str() {
            "on" => log.color = Some(true),
            "off" => log.color = Some(false),
            _ => {}
        }
    }
    if overrides.log_level.is_some() || overrides.log_color.is_some() {
        cfg.log = Some(log);
    }
}

fn find_nearest_config_file(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
