//! Report document, assembly, and the send-once lifecycle.
//!
//! One report exists per invocation. The [`ReportAssembler`] builds and
//! mutates the [`ReportDocument`]; the [`ReportLifecycle`] owns it and
//! guarantees the single-send, never-block-the-host properties.

pub mod assembler;
pub mod document;
pub mod lifecycle;

pub use assembler::ReportAssembler;
pub use document::{
    AgentInfo, Environment, ErrorRecord, HostInfo, InvocationMetadata, MemoryUsage, OsReport,
    ProcessSnapshots, ReportDocument, ReportedError, RuntimeInfo,
};
pub use lifecycle::{CompletionReceiver, CompletionSignal, ReportLifecycle};
