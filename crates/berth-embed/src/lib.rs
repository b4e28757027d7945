//! Embedded loopback HTTP service for the Berth shell.
//!
//! Hosts a prebuilt frontend asset directory plus a small meta surface
//! (`/healthz`, `/about`). The service is started on a background task by
//! the launch coordinator and reports its state through a single-writer
//! readiness channel; it never outlives the process that embeds it.

mod access_log;
pub mod config;
mod meta;
mod responses;
pub mod router;
mod security;
mod serve;
pub mod static_assets;
#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ServiceConfig};
pub use serve::{serve, Readiness};
