use pulsemon_common::types::LoadAverage;
use sysinfo::System;

use crate::rates::round2;

pub fn load_average() -> LoadAverage {
    let avg = System::load_average();
    LoadAverage {
        one_min: round2(avg.one),
        five_min: round2(avg.five),
        fifteen_min: round2(avg.fifteen),
    }
}

/// Uptime rendered like a clock reading: `H:MM:SS`, prefixed with a day
/// count once it passes 24 hours (`3 days, 4:05:06`).
pub fn uptime_string() -> String {
    format_uptime(System::uptime())
}

pub(crate) fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let rest = total_secs % 86_400;
    let hours = rest / 3_600;
    let minutes = (rest % 3_600) / 60;
    let seconds = rest % 60;
    match days {
        0 => format!("{hours}:{minutes:02}:{seconds:02}"),
        1 => format!("1 day, {hours}:{minutes:02}:{seconds:02}"),
        n => format!("{n} days, {hours}:{minutes:02}:{seconds:02}"),
    }
}
