use pulsemon_common::types::NvidiaGpu;

use crate::command::run_tool;
use crate::error::{CollectError, Result};
use crate::rates::round2;

const TOOL: &str = "nvidia-smi";
const QUERY_ARGS: &[&str] = &[
    "--query-gpu=name,utilization.gpu,memory.used,memory.total,temperature.gpu",
    "--format=csv,noheader,nounits",
];

pub async fn collect() -> Result<Vec<NvidiaGpu>> {
    let output = run_tool(TOOL, QUERY_ARGS).await?;
    if !output.success() {
        return Err(CollectError::Failed {
            tool: TOOL,
            status: output.status,
            detail: output.stderr_brief(),
        });
    }
    Ok(gpus_from_csv(&output.stdout))
}

/// One GPU per CSV row. A row with a missing or unparseable field is
/// skipped rather than failing the whole list.
pub(crate) fn gpus_from_csv(csv: &str) -> Vec<NvidiaGpu> {
    csv.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<NvidiaGpu> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, utilization, mem_used, mem_total, temperature] = fields[..] else {
        tracing::debug!(line, "skipping malformed nvidia-smi row");
        return None;
    };
    let gpu = NvidiaGpu {
        name: name.to_string(),
        utilization_percent: parse_value(utilization)?,
        memory_used_mb: parse_value(mem_used)?,
        memory_total_mb: parse_value(mem_total)?,
        temperature_c: parse_value(temperature)?,
    };
    Some(gpu)
}

fn parse_value(field: &str) -> Option<f64> {
    match field.parse::<f64>() {
        Ok(v) => Some(round2(v)),
        Err(_) => {
            tracing::debug!(field, "unparseable nvidia-smi value, skipping row");
            None
        }
    }
}
