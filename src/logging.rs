//! Tracing setup.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Log to stderr. `--debug` turns on request-level output for this crate and
/// the HTTP stack; otherwise `RUST_LOG` or `warn` applies.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::new("auer_cfg=debug,ureq=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(debug);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
