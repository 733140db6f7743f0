//! Mock filesystem implementations for testing.
//!
//! Provides `MockFs` and a pre-built scenario for exercising the stats
//! provider without a real Linux `/proc` filesystem.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
