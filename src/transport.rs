//! HTTPS delivery of serialized reports to the collector.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, OnceLock};

use crate::config::Config;
use crate::report::ReportDocument;

/// Collector port. Fixed; only host and path come from configuration.
const COLLECTOR_PORT: u16 = 443;

/// Coarse delivery outcome reported back to the lifecycle.
///
/// Any HTTP status counts as a completed delivery; the lifecycle never
/// interprets the status code as a failure.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Error type for delivery failures. Never escapes the lifecycle.
#[derive(Debug)]
pub enum TransportError {
    /// The document could not be serialized.
    Serialize(serde_json::Error),
    /// The HTTP client could not be constructed.
    Client(reqwest::Error),
    /// Connection, timeout, write, or read failure.
    Request(reqwest::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Serialize(e) => write!(f, "cannot serialize report: {}", e),
            TransportError::Client(e) => write!(f, "cannot build HTTP client: {}", e),
            TransportError::Request(e) => write!(f, "delivery failed: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Serialize(e) => Some(e),
            TransportError::Client(e) | TransportError::Request(e) => Some(e),
        }
    }
}

/// Delivery seam between the lifecycle and the network.
pub trait Transport: Send + Sync + 'static {
    /// Serializes `document` and performs one delivery attempt. No retries.
    ///
    /// `resolved` carries an upstream-resolved collector address; `None`
    /// means resolve the hostname during connection setup.
    fn send(
        &self,
        document: &ReportDocument,
        config: &Config,
        resolved: Option<IpAddr>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Production transport: HTTPS POST of the JSON document.
///
/// Hostname-resolved sends share one lazily built `reqwest::Client`,
/// amortizing TLS handshakes over its connection pool. A send that carries a
/// resolved address must connect to exactly that IP, so those use a separate
/// client whose `resolve()` override matches the address; it is cached and
/// only rebuilt when the address changes. TLS server-name and certificate
/// validation always target `config.host`.
#[derive(Debug, Default)]
pub struct HttpsTransport {
    base: OnceLock<reqwest::Client>,
    pinned: Mutex<Option<(IpAddr, reqwest::Client)>>,
}

impl HttpsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(
        config: &Config,
        resolved: Option<IpAddr>,
    ) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(config.network_timeout);
        if let Some(ip) = resolved {
            builder = builder.resolve(&config.host, SocketAddr::new(ip, COLLECTOR_PORT));
        }
        builder.build().map_err(TransportError::Client)
    }

    /// Hands back the client matching `resolved` for this send.
    fn client(
        &self,
        config: &Config,
        resolved: Option<IpAddr>,
    ) -> Result<reqwest::Client, TransportError> {
        match resolved {
            None => {
                if let Some(client) = self.base.get() {
                    return Ok(client.clone());
                }
                let client = Self::build(config, None)?;
                Ok(self.base.get_or_init(|| client).clone())
            }
            Some(ip) => {
                let mut pinned = self.pinned.lock().unwrap();
                if let Some((cached_ip, client)) = pinned.as_ref() {
                    if *cached_ip == ip {
                        return Ok(client.clone());
                    }
                }
                let client = Self::build(config, Some(ip))?;
                *pinned = Some((ip, client.clone()));
                Ok(client)
            }
        }
    }
}

impl Transport for HttpsTransport {
    fn send(
        &self,
        document: &ReportDocument,
        config: &Config,
        resolved: Option<IpAddr>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        let body = serde_json::to_vec(document).map_err(TransportError::Serialize);
        let url = format!("https://{}:{}{}", config.host, COLLECTOR_PORT, config.path);
        let client = self.client(config, resolved);

        async move {
            let response = client?
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body?)
                .send()
                .await
                .map_err(TransportError::Request)?;

            let status = response.status().as_u16();
            // Stream the full response body before resolving.
            let body = response.text().await.map_err(TransportError::Request)?;

            Ok(TransportResponse { status, body })
        }
    }
}
