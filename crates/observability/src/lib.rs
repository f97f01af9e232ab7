//! `bizscope-observability`
//!
//! **Responsibility:** process-wide `tracing` subscriber setup for binaries
//! and services embedding the analytics engine.
//!
//! Library crates only emit events; installing a subscriber is the
//! embedding process's decision, made once at startup.

pub mod subscriber;

pub use subscriber::{init_with, LogFormat};

/// Install the default subscriber: JSON lines, filtered by `RUST_LOG`
/// (falling back to `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init_with(LogFormat::Json, "info");
}
