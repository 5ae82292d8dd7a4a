use std::path::Path;

use console::style;
use log::info;
use serde::Serialize;

use crate::types::{AppResult, ArtifactSet, Backend, BuildTarget};

#[derive(Serialize)]
struct TargetInfo {
    target: BuildTarget,
    enabled: bool,
    artifacts: Option<ArtifactSet>,
}

#[derive(Serialize)]
struct JsonTargets {
    backend: Backend,
    targets: Vec<TargetInfo>,
}

/// List the catalog with each target's coverage eligibility. Read-only.
pub fn execute_targets(info_dir: &Path, backend: Backend, format: &str) -> AppResult<()> {
    let targets = BuildTarget::load_catalog(info_dir)?;
    let infos: Vec<TargetInfo> = targets
        .into_iter()
        .map(|target| {
            let artifacts = ArtifactSet::locate(&target, backend);
            TargetInfo {
                enabled: artifacts.as_ref().is_some_and(ArtifactSet::is_enabled),
                target,
                artifacts,
            }
        })
        .collect();

    if format == "json" {
        let json = JsonTargets {
            backend,
            targets: infos,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if infos.is_empty() {
        info!("No targets found");
        return Ok(());
    }

    for entry in &infos {
        let status = match &entry.artifacts {
            None => style("not executable").dim(),
            Some(_) if entry.enabled => style("coverage").green(),
            Some(_) => style("no coverage").yellow(),
        };
        info!("Target: {} ({})", entry.target.name, status);
        if let Some(artifacts) = &entry.artifacts {
            let present: Vec<String> = artifacts.present().map(|k| k.to_string()).collect();
            if present.is_empty() {
                info!("  Artifacts: none");
            } else {
                info!("  Artifacts: {}", present.join(", "));
            }
        }
    }

    let enabled = infos.iter().filter(|i| i.enabled).count();
    info!("");
    info!(
        "{} of {} target(s) have {} coverage data",
        enabled,
        infos.len(),
        backend
    );
    Ok(())
}
