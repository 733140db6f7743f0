//! Diagnostic logging setup.
//!
//! Library code emits everything through `tracing`; hosts that want the
//! reporter's diagnostics on stderr can call [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber for the reporter.
///
/// With `debug` set, reporter diagnostics (outgoing documents, collector
/// responses, swallowed delivery failures) are logged at debug level;
/// otherwise only warnings and above. `RUST_LOG` directives take precedence.
///
/// Returns quietly if a subscriber is already installed.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lamreport={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
