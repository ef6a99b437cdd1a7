//! Tracing initialization for the Tiller CLI.
//!
//! Console-only: an `EnvFilter` gated by `RUST_LOG` (falling back to the
//! configured level) feeding the standard `fmt` layer on stderr, so log
//! lines never interleave with console prompts on stdout.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Call once at startup, before any `tracing` events are emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
