//! Host metric sources for pulsemon.
//!
//! Each module samples one metric category; [`StatsCollector`] fans out
//! across all of them once per cycle and assembles the wire
//! [`Snapshot`](pulsemon_common::Snapshot), with per-source failures
//! confined to their own slot.

pub mod command;
pub mod cpu;
pub mod diskio;
pub mod docker;
pub mod error;
pub mod load;
pub mod logs;
pub mod memory;
pub mod network;
pub mod nvidia;
pub mod orchestrator;
pub mod processes;
pub mod radeontop;
pub mod rates;
pub mod sensors;
pub mod storage;

pub use error::{CollectError, Result};
pub use logs::LogSource;
pub use orchestrator::{CollectorConfig, StatsCollector};
