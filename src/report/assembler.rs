//! Report assembly: skeleton construction and late-bound merges.

use std::time::Duration;

use crate::collector::{OsSnapshot, ProcStatSample, ProcStatusSample};
use crate::config::Config;
use crate::context::InvocationContext;
use crate::process_state::ProcessState;
use crate::report::document::{
    AgentInfo, Environment, HostInfo, InvocationMetadata, MemoryUsage, OsReport,
    ProcessSnapshots, ReportDocument, ReportedError, RuntimeInfo,
};

/// Page size used to convert resident-set pages to bytes.
const PAGE_SIZE: u64 = 4096;

/// Builds and mutates report documents.
///
/// Construction is synchronous and infallible; late-bound fields (stats,
/// error, duration) are merged in place at send time. The merge methods are
/// pure mutation with no I/O.
pub struct ReportAssembler;

impl ReportAssembler {
    /// Builds the initial skeleton from configuration, invocation context,
    /// and a pre-supplied metrics sequence.
    ///
    /// Consumes the process coldstart flag: the first skeleton a process
    /// builds carries `coldstart: true`, every later one `false`, regardless
    /// of send order.
    pub fn new(
        config: &Config,
        context: &InvocationContext,
        metrics: Vec<serde_json::Value>,
        state: &ProcessState,
    ) -> ReportDocument {
        ReportDocument {
            client_id: config.client_id.clone(),
            install_method: config.install_method.clone(),
            duration: None,
            process_id: state.process_id().to_string(),
            invocation: InvocationMetadata {
                function_name: context.function_name.clone(),
                function_version: context.function_version.clone(),
                request_id: context.request_id.clone(),
                invoked_function_arn: context.invoked_function_arn.clone(),
                log_group_name: context.log_group_name.clone(),
                log_stream_name: context.log_stream_name.clone(),
                memory_limit_in_mb: context.memory_limit_in_mb,
                remaining_time_in_millis: None,
                trace_id: context
                    .trace_id
                    .clone()
                    .or_else(|| std::env::var("_X_AMZN_TRACE_ID").ok()),
            },
            environment: Environment {
                agent: AgentInfo {
                    runtime: crate::RUNTIME.to_string(),
                    version: state.version().to_string(),
                    load_time: state.load_time(),
                },
                runtime: RuntimeInfo {
                    name: crate::RUNTIME.to_string(),
                    memory_usage: None,
                },
                host: HostInfo::default(),
                os: None,
            },
            errors: None,
            coldstart: state.consume_coldstart(),
            custom_metrics: metrics,
        }
    }

    /// Fills the OS section, host identifiers, and runtime memory usage from
    /// resolved statistics. Lookups that failed arrive as `None` and leave
    /// their field absent.
    pub fn merge_stats(
        report: &mut ReportDocument,
        os: OsSnapshot,
        stat_start: Option<ProcStatSample>,
        stat: Option<ProcStatSample>,
        status: Option<ProcStatusSample>,
        boot_id: Option<String>,
        container_id: Option<String>,
    ) {
        report.environment.runtime.memory_usage = stat.as_ref().map(|s| MemoryUsage {
            rss_bytes: s.rss.max(0) as u64 * PAGE_SIZE,
            vsize_bytes: s.vsize,
        });
        report.environment.os = Some(OsReport {
            snapshot: os,
            process: ProcessSnapshots {
                stat_start,
                stat,
                status,
            },
        });
        report.environment.host.boot_id = boot_id;
        report.environment.host.container_id = container_id;
    }

    /// Normalizes `err` into the canonical record and attaches it.
    ///
    /// Called at most once per report, before the stats merge.
    pub fn merge_error(report: &mut ReportDocument, err: ReportedError) {
        report.errors = Some(err.into_record());
    }

    /// Assigns the elapsed wall-clock time, in whole nanoseconds rounded up.
    pub fn finalize_duration(report: &mut ReportDocument, elapsed: Duration) {
        report.duration = Some(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }
}
