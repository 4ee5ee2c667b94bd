use pulsemon_common::types::{ContainerInfo, ContainerList};
use serde::Deserialize;

use crate::command::run_tool;
use crate::error::CollectError;

const TOOL: &str = "docker";
const PS_ARGS: &[&str] = &["ps", "--format", "{{json .}}"];

/// One row of `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Status", default)]
    status: String,
}

/// Running containers. Never fails: a missing CLI or unreachable daemon
/// degrades to a status string with an empty list.
pub async fn collect() -> ContainerList {
    match run_tool(TOOL, PS_ARGS).await {
        Ok(output) if output.success() => ContainerList {
            status: "ok".to_string(),
            containers: containers_from_lines(&output.stdout),
        },
        Ok(output) => unavailable(format!("docker unavailable: {}", output.stderr_brief())),
        Err(CollectError::Spawn { .. }) => unavailable("docker not installed".to_string()),
        Err(e) => unavailable(e.to_string()),
    }
}

fn unavailable(status: String) -> ContainerList {
    tracing::info!(status = %status, "container runtime not queryable");
    ContainerList {
        status,
        containers: Vec::new(),
    }
}

pub(crate) fn containers_from_lines(raw: &str) -> Vec<ContainerInfo> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match serde_json::from_str::<PsRow>(line) {
                Ok(row) => Some(ContainerInfo {
                    id: row.id,
                    name: row.names,
                    image: row.image,
                    state: row.state,
                    status: row.status,
                }),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable docker ps row");
                    None
                }
            }
        })
        .collect()
}
