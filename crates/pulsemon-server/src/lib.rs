//! WebSocket streaming front for pulsemon.
//!
//! Viewers connect to `/ws` and receive a full telemetry snapshot
//! immediately, then every broadcast cycle. The sampling loop is lazy: it
//! starts with the first viewer and then runs for the life of the process.

pub mod app;
pub mod broadcast;
pub mod config;
pub mod state;
pub mod ws;
