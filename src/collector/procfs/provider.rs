//! Stats provider backed by the Linux `/proc` filesystem.

use std::path::Path;

use crate::collector::procfs::parser::{
    self, ProcStatSample, ProcStatusSample,
};
use crate::collector::stats::{CollectError, OsSnapshot, SystemStatsProvider};
use crate::collector::traits::FileSystem;

/// Production stats provider reading from `/proc`.
///
/// Async lookups push the blocking reads onto `spawn_blocking` so they can
/// progress concurrently without stalling the runtime.
pub struct ProcfsStatsProvider<F: FileSystem + Clone + 'static> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem + Clone + 'static> ProcfsStatsProvider<F> {
    /// Creates a new provider.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to the proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    async fn read_file(&self, relative: &str) -> Result<String, CollectError> {
        let fs = self.fs.clone();
        let path = format!("{}/{}", self.proc_path, relative);
        tokio::task::spawn_blocking(move || fs.read_to_string(Path::new(&path)))
            .await
            .map_err(|e| CollectError::Task(e.to_string()))?
            .map_err(CollectError::Io)
    }

    fn read_file_sync(&self, relative: &str) -> Option<String> {
        let path = format!("{}/{}", self.proc_path, relative);
        self.fs.read_to_string(Path::new(&path)).ok()
    }
}

impl<F: FileSystem + Clone + 'static> SystemStatsProvider for ProcfsStatsProvider<F> {
    fn read_proc_stat(
        &self,
    ) -> impl Future<Output = Result<ProcStatSample, CollectError>> + Send {
        async {
            let content = self.read_file("self/stat").await?;
            parser::parse_proc_stat(&content).map_err(|e| CollectError::Parse(e.message))
        }
    }

    fn read_proc_status(
        &self,
    ) -> impl Future<Output = Result<ProcStatusSample, CollectError>> + Send {
        async {
            let content = self.read_file("self/status").await?;
            parser::parse_proc_status(&content).map_err(|e| CollectError::Parse(e.message))
        }
    }

    fn read_boot_id(&self) -> impl Future<Output = Result<String, CollectError>> + Send {
        async {
            let content = self.read_file("sys/kernel/random/boot_id").await?;
            parser::parse_boot_id(&content).map_err(|e| CollectError::Parse(e.message))
        }
    }

    /// Aggregates hostname, uptime, memory, and CPU times. Anything that
    /// cannot be read or parsed comes back as its default.
    fn os_snapshot(&self) -> OsSnapshot {
        let hostname = self
            .read_file_sync("sys/kernel/hostname")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let uptime = self
            .read_file_sync("uptime")
            .and_then(|s| parser::parse_uptime(&s).ok())
            .unwrap_or(0);

        let totals = self
            .read_file_sync("meminfo")
            .and_then(|s| parser::parse_meminfo(&s).ok())
            .unwrap_or_default();
        let totalmem = totals.total_kb * 1024;
        let freemem = totals.free_kb * 1024;

        let cpus = self
            .read_file_sync("stat")
            .and_then(|s| parser::parse_cpu_times(&s).ok())
            .unwrap_or_default();

        OsSnapshot {
            hostname,
            uptime,
            totalmem,
            freemem,
            usedmem: totalmem.saturating_sub(freemem),
            cpus,
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    fn container_id(&self) -> Option<String> {
        let content = self.read_file_sync("self/cgroup")?;
        parser::parse_container_id(&content)
    }
}
