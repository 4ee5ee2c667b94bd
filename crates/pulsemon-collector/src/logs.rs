use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use pulsemon_common::types::LogTail;
use serde::{Deserialize, Serialize};

/// Number of lines kept from the end of each log file.
pub const TAIL_LINES: usize = 25;

/// Only this much of the file end is read, so tailing a multi-gigabyte log
/// stays cheap.
const TAIL_WINDOW: u64 = 64 * 1024;

/// A log file to tail, as named in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSource {
    pub name: String,
    pub path: String,
}

pub fn collect(sources: &[LogSource]) -> Vec<LogTail> {
    sources
        .iter()
        .map(|source| LogTail {
            name: source.name.clone(),
            path: source.path.clone(),
            lines: tail_file(Path::new(&source.path), TAIL_LINES),
        })
        .collect()
}

/// Last `count` lines of `path`. Read failures produce a single placeholder
/// line instead of an error, so one unreadable file never taints the whole
/// category. Invalid UTF-8 is replaced, not rejected.
pub(crate) fn tail_file(path: &Path, count: usize) -> Vec<String> {
    match read_tail(path, count) {
        Ok(lines) => lines,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            vec![format!("Log file not found at {}", path.display())]
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            vec![format!("Permission denied reading log file: {}", path.display())]
        }
        Err(e) => vec![format!("Error reading log file {}: {e}", path.display())],
    }
}

fn read_tail(path: &Path, count: usize) -> std::io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(TAIL_WINDOW);
    if start > 0 {
        file.seek(SeekFrom::Start(start))?;
    }
    let mut buf = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);
    let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
    // A mid-file window almost certainly starts inside a line; drop it.
    if start > 0 && !lines.is_empty() {
        lines.remove(0);
    }
    let begin = lines.len().saturating_sub(count);
    Ok(lines.split_off(begin))
}
