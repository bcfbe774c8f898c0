//! Tracing configuration and initialization.

use std::io::IsTerminal as _;

use tracing_subscriber::{
    EnvFilter,
    layer::SubscriberExt as _,
    util::{SubscriberInitExt as _, TryInitError},
};

/// Initialize the global tracing subscriber.
///
/// The filter comes from `BURROW_LOG`, falling back to the default env
/// (`RUST_LOG`), falling back to `info`. Output goes to stderr, colored only
/// when stderr is a terminal.
pub fn init() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_env("BURROW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
}
