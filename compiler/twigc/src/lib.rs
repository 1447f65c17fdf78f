//! Twig command-line rewriter.
//!
//! Reads a syntax tree in nested-array JSON form, runs one of the built-in
//! rewrite passes over it, and writes the result back as JSON.

pub mod json;
pub mod passes;

pub use passes::{run_pass, Pass, PassError, PassReport};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output.
///
/// Set `RUST_LOG=twig_pattern=debug` to see compile and match events.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}
