use std::collections::BTreeMap;
use std::sync::LazyLock;

use pulsemon_common::types::AmdGpuStats;
use regex::Regex;

use crate::command::{run_tool, ToolOutput};
use crate::error::{CollectError, Result};
use crate::rates::round2;

const TOOL: &str = "radeontop";
const PRIMARY_ARGS: &[&str] = &["-d", "-", "-l", "1", "-i", "1"];
/// Older builds reject `-i`; the retry drops it.
const FALLBACK_ARGS: &[&str] = &["-d", "-", "-l", "1"];
const UNKNOWN_DEVICE: &str = "Unknown AMD GPU";

/// Dump rows look like
/// `1712345678.5: bus 03, gpu 12.34%, ..., vram 5.00% 512.00mb, sclk 80.00% 1.200ghz, ...`.
static DATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:\.\d+)?:\s*bus\s+\S+\s*(.*)$").unwrap());
static GPU_LOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgpu\s+(\d+(?:\.\d+)?)%").unwrap());
static VRAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bvram\s+(\d+(?:\.\d+)?)%\s+(\d+(?:\.\d+)?)\s*(mb|gb)\b").unwrap());
static SCLK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsclk\s+(\d+(?:\.\d+)?)%\s+(\d+(?:\.\d+)?)\s*(mhz|ghz)\b").unwrap());
static MCLK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmclk\s+(\d+(?:\.\d+)?)%\s+(\d+(?:\.\d+)?)\s*(mhz|ghz)\b").unwrap());
/// Interactive header: `radeontop v1.4, running on NAVI23 bus 0b, 120 samples/sec`.
static DEVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)running on\s+(.+?)(?:\s+bus\s+\S+)?,").unwrap());

/// Metrics pulled out of raw radeontop text. Keys are normalized to
/// percent / mb / mhz units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGpuMetrics {
    pub device: Option<String>,
    pub metrics: BTreeMap<String, f64>,
}

/// Extracts whatever it can from `raw`; never fails. No data line means an
/// empty metric set, which callers report as "no usable data" rather than a
/// tool error. Each metric is matched independently, so one missing or
/// mangled field leaves the rest intact.
pub fn parse(raw: &str) -> ParsedGpuMetrics {
    let mut parsed = ParsedGpuMetrics {
        device: device_name(raw),
        metrics: BTreeMap::new(),
    };

    // Newest dump row wins when the tool emitted more than one.
    let body = raw
        .lines()
        .rev()
        .find_map(|line| DATA_LINE.captures(line).map(|c| c[1].to_string()));
    let Some(body) = body else {
        return parsed;
    };

    if let Some(c) = GPU_LOAD.captures(&body) {
        parsed.insert("gpu_load_percent", num(&c[1]));
    }
    if let Some(c) = VRAM.captures(&body) {
        parsed.insert("vram_used_percent", num(&c[1]));
        parsed.insert("vram_used_mb", to_mb(num(&c[2]), &c[3]));
    }
    if let Some(c) = SCLK.captures(&body) {
        parsed.insert("gpu_clock_sclk_percent", num(&c[1]));
        parsed.insert("gpu_clock_sclk_mhz", to_mhz(num(&c[2]), &c[3]));
    }
    if let Some(c) = MCLK.captures(&body) {
        parsed.insert("mem_clock_mclk_percent", num(&c[1]));
        parsed.insert("mem_clock_mclk_mhz", to_mhz(num(&c[2]), &c[3]));
    }
    parsed
}

impl ParsedGpuMetrics {
    fn insert(&mut self, key: &str, value: f64) {
        self.metrics.insert(key.to_string(), round2(value));
    }
}

fn num(digits: &str) -> f64 {
    digits.parse().unwrap_or_default()
}

fn to_mb(value: f64, unit: &str) -> f64 {
    if unit.eq_ignore_ascii_case("gb") {
        value * 1024.0
    } else {
        value
    }
}

fn to_mhz(value: f64, unit: &str) -> f64 {
    if unit.eq_ignore_ascii_case("ghz") {
        value * 1000.0
    } else {
        value
    }
}

fn device_name(raw: &str) -> Option<String> {
    if let Some(caps) = DEVICE.captures(raw) {
        let name = caps[1].trim().to_string();
        if !name.is_empty() {
            return Some(name);
        }
    }
    raw.lines()
        .filter(|line| !DATA_LINE.is_match(line))
        .find(|line| line.contains("Radeon") || line.contains("AMD"))
        .map(|line| line.trim().to_string())
}

/// Dump mode announces itself on stderr; that banner is not a failure.
fn benign_stderr(stderr: &str) -> bool {
    stderr.trim_start().starts_with("Dumping to")
}

pub async fn collect() -> Result<AmdGpuStats> {
    let output = invoke().await?;
    Ok(stats_from_output(&output.stdout))
}

async fn invoke() -> Result<ToolOutput> {
    let first = run_tool(TOOL, PRIMARY_ARGS).await?;
    if first.success() || benign_stderr(&first.stderr) {
        return Ok(first);
    }
    tracing::debug!(status = %first.status, "radeontop primary arguments rejected, retrying");
    let second = run_tool(TOOL, FALLBACK_ARGS).await?;
    if second.success() || benign_stderr(&second.stderr) {
        return Ok(second);
    }
    Err(CollectError::Failed {
        tool: TOOL,
        status: second.status,
        detail: second.stderr_brief(),
    })
}

pub(crate) fn stats_from_output(raw: &str) -> AmdGpuStats {
    let parsed = parse(raw);
    let status = if parsed.metrics.is_empty() {
        "no usable data from radeontop".to_string()
    } else {
        "ok".to_string()
    };
    AmdGpuStats {
        status,
        device: parsed.device.unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
        metrics: parsed.metrics,
    }
}
