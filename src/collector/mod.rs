//! Process and host statistics collection.
//!
//! The report lifecycle consumes statistics through the
//! [`SystemStatsProvider`] seam: three async lookups (process stat, process
//! status, boot id) plus a synchronous, never-failing OS aggregate snapshot.
//! On Linux the provider reads `/proc` through the [`FileSystem`] trait,
//! which a [`MockFs`](mock::MockFs) can stand in for during tests or on
//! platforms without procfs; environments with no stat source at all use
//! [`NoopStatsProvider`].

pub mod mock;
pub mod procfs;
mod stats;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CpuTimes, ParseError, ProcStatSample, ProcStatusSample, ProcfsStatsProvider};
pub use stats::{CollectError, NoopStatsProvider, OsSnapshot, SystemStatsProvider};
pub use traits::{FileSystem, RealFs};
