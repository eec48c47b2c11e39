//! Render-job orchestration: the session adapter, copy-back throttling and the interactive and
//! offline drivers.

pub mod adapter;
/// Render-job configuration.
pub mod config;
pub mod host;
/// Interactive viewport state machine.
pub mod interactive;
/// Offline frame renders.
pub mod offline;
/// Copy-back throttling.
pub mod timer;
