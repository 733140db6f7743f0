//! Collector address resolution, injected into the report lifecycle.
//!
//! Resolution is decoupled from delivery so a host can start the lookup as
//! soon as it knows the collector hostname and hand the pending result to
//! every report it constructs.

use std::net::IpAddr;

use tokio::sync::oneshot;

/// Error produced by a failed collector lookup.
#[derive(Debug)]
pub enum DnsError {
    /// The lookup itself failed.
    Lookup(String, std::io::Error),
    /// The lookup succeeded but returned no addresses.
    NoAddress(String),
    /// The lookup task was dropped before producing a result.
    Cancelled,
}

impl std::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsError::Lookup(host, e) => write!(f, "lookup of {} failed: {}", host, e),
            DnsError::NoAddress(host) => write!(f, "lookup of {} returned no addresses", host),
            DnsError::Cancelled => write!(f, "lookup was cancelled"),
        }
    }
}

impl std::error::Error for DnsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DnsError::Lookup(_, e) => Some(e),
            _ => None,
        }
    }
}

/// An async dependency producing the collector's address.
///
/// Defaults to [`DnsResolution::Unresolved`], in which case the transport
/// resolves the hostname itself during connection setup.
#[derive(Debug, Default)]
pub enum DnsResolution {
    /// No upstream resolution; the transport connects by hostname.
    #[default]
    Unresolved,
    /// Address already known.
    Ready(IpAddr),
    /// Lookup in flight on a background task.
    Pending(oneshot::Receiver<Result<IpAddr, DnsError>>),
}

impl DnsResolution {
    /// Starts a background lookup of `host` on the current tokio runtime.
    pub fn spawn_lookup(host: impl Into<String>) -> Self {
        let host = host.into();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = match tokio::net::lookup_host((host.as_str(), 0)).await {
                Ok(mut addrs) => addrs
                    .next()
                    .map(|addr| addr.ip())
                    .ok_or_else(|| DnsError::NoAddress(host.clone())),
                Err(e) => Err(DnsError::Lookup(host.clone(), e)),
            };
            let _ = tx.send(result);
        });
        Self::Pending(rx)
    }

    /// Waits for the resolution outcome.
    ///
    /// `Ok(None)` means no upstream resolution was requested and the caller
    /// should connect by hostname.
    pub async fn wait(self) -> Result<Option<IpAddr>, DnsError> {
        match self {
            DnsResolution::Unresolved => Ok(None),
            DnsResolution::Ready(ip) => Ok(Some(ip)),
            DnsResolution::Pending(rx) => match rx.await {
                Ok(Ok(ip)) => Ok(Some(ip)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(DnsError::Cancelled),
            },
        }
    }
}
