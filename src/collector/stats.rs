//! The stats provider seam consumed by the report lifecycle.

use serde::Serialize;

use crate::collector::procfs::parser::{CpuTimes, ProcStatSample, ProcStatusSample};

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading stat files.
    Io(std::io::Error),
    /// Parse error in stat files.
    Parse(String),
    /// A background read task failed or was cancelled.
    Task(String),
    /// The platform has no readable stat source.
    Unsupported,
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
            CollectError::Task(msg) => write!(f, "background read failed: {}", msg),
            CollectError::Unsupported => write!(f, "stat collection unsupported on this platform"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Host-level aggregate snapshot embedded in the report's OS section.
///
/// Memory figures are in bytes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OsSnapshot {
    pub hostname: String,
    pub uptime: u64,
    pub totalmem: u64,
    pub freemem: u64,
    pub usedmem: u64,
    pub cpus: Vec<CpuTimes>,
    pub arch: String,
}

/// Source of process and host statistics.
///
/// The lifecycle consumes the async lookups as independent failure domains;
/// `os_snapshot` is synchronous and never fails (unavailable data comes back
/// as defaults).
pub trait SystemStatsProvider: Send + Sync + 'static {
    /// Reads a point-in-time snapshot of the current process's stat line.
    fn read_proc_stat(
        &self,
    ) -> impl Future<Output = Result<ProcStatSample, CollectError>> + Send;

    /// Reads a point-in-time snapshot of the current process's status.
    fn read_proc_status(
        &self,
    ) -> impl Future<Output = Result<ProcStatusSample, CollectError>> + Send;

    /// Reads the host boot identifier.
    fn read_boot_id(&self) -> impl Future<Output = Result<String, CollectError>> + Send;

    /// Synchronous host-level aggregates.
    fn os_snapshot(&self) -> OsSnapshot;

    /// Container identifier, when the process runs inside one.
    fn container_id(&self) -> Option<String>;
}

/// Stats provider for platforms without a readable `/proc`.
///
/// Every async lookup fails with [`CollectError::Unsupported`]; the lifecycle
/// degrades to a report without process snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatsProvider;

impl NoopStatsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SystemStatsProvider for NoopStatsProvider {
    fn read_proc_stat(
        &self,
    ) -> impl Future<Output = Result<ProcStatSample, CollectError>> + Send {
        async { Err(CollectError::Unsupported) }
    }

    fn read_proc_status(
        &self,
    ) -> impl Future<Output = Result<ProcStatusSample, CollectError>> + Send {
        async { Err(CollectError::Unsupported) }
    }

    fn read_boot_id(&self) -> impl Future<Output = Result<String, CollectError>> + Send {
        async { Err(CollectError::Unsupported) }
    }

    fn os_snapshot(&self) -> OsSnapshot {
        OsSnapshot {
            arch: std::env::consts::ARCH.to_string(),
            ..Default::default()
        }
    }

    fn container_id(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_provider_fails_lookups() {
        let provider = NoopStatsProvider::new();
        assert!(matches!(
            provider.read_proc_stat().await,
            Err(CollectError::Unsupported)
        ));
        assert!(matches!(
            provider.read_boot_id().await,
            Err(CollectError::Unsupported)
        ));
        assert!(provider.container_id().is_none());
    }

    #[test]
    fn test_noop_provider_still_reports_arch() {
        let snapshot = NoopStatsProvider::new().os_snapshot();
        assert_eq!(snapshot.arch, std::env::consts::ARCH);
        assert!(snapshot.cpus.is_empty());
    }
}
