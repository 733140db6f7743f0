//! The report document: one JSON-serializable record per invocation.

use std::backtrace::Backtrace;

use serde::Serialize;

use crate::collector::{OsSnapshot, ProcStatSample, ProcStatusSample};

/// The document delivered to the collector.
///
/// Exclusively owned by one report lifecycle; append-only until the final
/// merge step at send time.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_method: Option<String>,
    /// Nanoseconds between construction and send; `None` until send resolves
    /// the statistics.
    pub duration: Option<u64>,
    pub process_id: String,
    pub invocation: InvocationMetadata,
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorRecord>,
    pub coldstart: bool,
    pub custom_metrics: Vec<serde_json::Value>,
}

/// Invocation metadata echoed from the host context.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvocationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoked_function_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_stream_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_in_mb: Option<u32>,
    /// Computed at send time from the host's deadline capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time_in_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Agent, runtime, host, and OS details.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Environment {
    pub agent: AgentInfo,
    pub runtime: RuntimeInfo,
    pub host: HostInfo,
    /// `None` until the stats merge at send time.
    pub os: Option<OsReport>,
}

/// Identity of the reporting agent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentInfo {
    pub runtime: String,
    pub version: String,
    /// When the agent's process state was created, in epoch milliseconds.
    pub load_time: i64,
}

/// Runtime resource usage, captured at send time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeInfo {
    pub name: String,
    pub memory_usage: Option<MemoryUsage>,
}

/// Memory usage of the reporting process.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub vsize_bytes: u64,
}

/// Host identifiers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostInfo {
    pub boot_id: Option<String>,
    pub container_id: Option<String>,
}

/// OS aggregates plus the process snapshots taken at construction and send.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OsReport {
    #[serde(flatten)]
    pub snapshot: OsSnapshot,
    pub process: ProcessSnapshots,
}

/// The two stat snapshots ("start" and "current") and the status snapshot.
///
/// Fields are `None` when the corresponding lookup failed; a degraded report
/// still ships.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessSnapshots {
    pub stat_start: Option<ProcStatSample>,
    pub stat: Option<ProcStatSample>,
    pub status: Option<ProcStatusSample>,
}

/// Canonical error record attached to a report.
///
/// Absent fields serialize as `null` rather than being dropped, so the
/// collector sees a stable shape.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorRecord {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

/// Error input accepted by `send`: either a bare message or a structured
/// error value. Normalized into one [`ErrorRecord`] at the boundary.
#[derive(Debug, Clone)]
pub enum ReportedError {
    /// A plain message; gets a generic name and a freshly captured backtrace.
    Message(String),
    /// A structured error; fields are copied verbatim, absent ones stay null.
    Structured {
        name: Option<String>,
        message: Option<String>,
        stack: Option<String>,
        file_name: Option<String>,
        line_number: Option<u32>,
        column_number: Option<u32>,
    },
}

impl ReportedError {
    /// Normalizes into the canonical record shape.
    pub fn into_record(self) -> ErrorRecord {
        match self {
            ReportedError::Message(message) => ErrorRecord {
                name: "Error".to_string(),
                message,
                stack: Some(Backtrace::force_capture().to_string()),
                ..Default::default()
            },
            ReportedError::Structured {
                name,
                message,
                stack,
                file_name,
                line_number,
                column_number,
            } => ErrorRecord {
                name: name.unwrap_or_else(|| "Error".to_string()),
                message: message.unwrap_or_default(),
                stack,
                file_name,
                line_number,
                column_number,
            },
        }
    }
}

impl From<&str> for ReportedError {
    fn from(message: &str) -> Self {
        ReportedError::Message(message.to_string())
    }
}

impl From<String> for ReportedError {
    fn from(message: String) -> Self {
        ReportedError::Message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_error_gets_generic_name_and_stack() {
        let record = ReportedError::from("boom").into_record();
        assert_eq!(record.name, "Error");
        assert_eq!(record.message, "boom");
        let stack = record.stack.unwrap();
        assert!(!stack.is_empty());
        assert!(record.file_name.is_none());
    }

    #[test]
    fn test_structured_error_copies_fields_verbatim() {
        let record = ReportedError::Structured {
            name: Some("TypeError".to_string()),
            message: Some("x is not a function".to_string()),
            stack: Some("at handler (index.rs:3:7)".to_string()),
            file_name: Some("index.rs".to_string()),
            line_number: Some(3),
            column_number: Some(7),
        }
        .into_record();
        assert_eq!(record.name, "TypeError");
        assert_eq!(record.message, "x is not a function");
        assert_eq!(record.stack.as_deref(), Some("at handler (index.rs:3:7)"));
        assert_eq!(record.file_name.as_deref(), Some("index.rs"));
        assert_eq!(record.line_number, Some(3));
        assert_eq!(record.column_number, Some(7));
    }

    #[test]
    fn test_structured_error_tolerates_missing_fields() {
        let record = ReportedError::Structured {
            name: None,
            message: None,
            stack: None,
            file_name: None,
            line_number: None,
            column_number: None,
        }
        .into_record();
        assert_eq!(record.name, "Error");
        assert_eq!(record.message, "");
        assert!(record.stack.is_none());
        assert!(record.line_number.is_none());
    }

    #[test]
    fn test_error_record_serializes_absent_fields_as_null() {
        let value = serde_json::to_value(ErrorRecord {
            name: "Error".to_string(),
            message: "boom".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(value["stack"].is_null());
        assert!(value["file_name"].is_null());
        assert!(value["line_number"].is_null());
    }
}
