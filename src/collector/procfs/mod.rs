//! `/proc`-backed statistics collection.

pub mod parser;
mod provider;

pub use parser::{CpuTimes, ParseError, ProcStatSample, ProcStatusSample};
pub use provider::ProcfsStatsProvider;
