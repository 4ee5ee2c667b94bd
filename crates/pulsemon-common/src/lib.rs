pub mod types;

pub use types::{Sample, Snapshot, UPDATE_STATS_EVENT};
