//! Telemetry setup: structured JSON logs plus optional OTLP trace export.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext or nonces** must appear in any span
//!   attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
