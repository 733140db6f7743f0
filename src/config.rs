//! Reporter configuration.

use std::time::Duration;

/// Default collector hostname.
pub const DEFAULT_HOST: &str = "telemetry.lamreport.dev";

/// Default collector path.
pub const DEFAULT_PATH: &str = "/v0/report";

/// Default network timeout for a single delivery attempt.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Recognized reporter options.
///
/// Read-only after construction; one `Config` is typically shared by every
/// report a process produces.
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque client identifier, echoed into every report.
    pub client_id: Option<String>,
    /// How the agent was installed (package manager, layer, manual), echoed
    /// into every report.
    pub install_method: Option<String>,
    /// Collector hostname. Also the TLS server name when the connection is
    /// made to a pre-resolved address.
    pub host: String,
    /// Collector request path.
    pub path: String,
    /// Timeout for a single delivery attempt.
    pub network_timeout: Duration,
    /// Selects the debug log level when the host installs the reporter's
    /// subscriber via [`crate::logging::init`]. Diagnostics (outgoing
    /// document, collector response, swallowed failures) are emitted at
    /// debug level and gated by the subscriber filter.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            install_method: None,
            host: DEFAULT_HOST.to_string(),
            path: DEFAULT_PATH.to_string(),
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            debug: false,
        }
    }
}
