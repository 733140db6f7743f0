//! lamreport — one-shot invocation telemetry reporter.
//!
//! Runs inside a short-lived compute invocation (e.g. a serverless function
//! execution), gathers process and host runtime statistics, assembles them
//! with invocation metadata and optional error/metric data into a structured
//! report, and delivers that report exactly once to a remote collector over
//! HTTPS. Delivery is best-effort: the host invocation is never blocked or
//! failed by collector unavailability.
//!
//! Provides:
//! - `collector` — process/host statistics from `/proc`, with mocking support
//! - `report` — report document, assembly, and the send-once lifecycle
//! - `transport` — HTTPS delivery to the collector
//! - `dns` — injectable collector address resolution
//! - `config` — recognized reporter options
//! - `process_state` — process-scoped identity and the coldstart flag
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use lamreport::{
//!     CompletionSignal, Config, DnsResolution, HttpsTransport, InvocationContext,
//!     ProcessState, ReportLifecycle,
//! };
//! use lamreport::collector::{ProcfsStatsProvider, RealFs};
//!
//! let provider = Arc::new(ProcfsStatsProvider::new(RealFs::new(), "/proc"));
//! let transport = Arc::new(HttpsTransport::new());
//! let config = Arc::new(Config::default());
//! let lifecycle = ReportLifecycle::new(
//!     provider,
//!     transport,
//!     Arc::clone(&config),
//!     InvocationContext::default(),
//!     Vec::new(),
//!     DnsResolution::spawn_lookup(&config.host),
//!     ProcessState::global(),
//! );
//!
//! // ... run the invocation ...
//!
//! let (done, finished) = CompletionSignal::channel();
//! lifecycle.send(None, done);
//! let _ = finished.await; // safe to suspend the invocation
//! ```

pub mod collector;
pub mod config;
pub mod context;
pub mod dns;
pub mod logging;
pub mod process_state;
pub mod report;
pub mod transport;

pub use config::Config;
pub use context::InvocationContext;
pub use dns::DnsResolution;
pub use process_state::ProcessState;
pub use report::{CompletionSignal, ReportLifecycle, ReportedError};
pub use transport::HttpsTransport;

/// Crate version, reported in the agent section of every document.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime label reported in the agent section of every document.
pub const RUNTIME: &str = "rust";
