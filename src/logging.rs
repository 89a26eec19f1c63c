//! Diagnostic tracing for the CLI.
//!
//! Everything goes to stderr so stdout stays reserved for workflow commands
//! and `--print` output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `TIDEMARK_LOG` wins over `RUST_LOG`; with neither set the level is `info`,
/// or `debug` when `verbose` is on.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = ["TIDEMARK_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|var| EnvFilter::try_from_env(var).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
