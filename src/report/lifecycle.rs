//! The send-once report lifecycle.
//!
//! One `ReportLifecycle` instance exists per invocation. Construction kicks
//! off the early stat lookups and builds the report skeleton; `send` merges
//! everything, computes the duration, and hands the finished document to the
//! transport. Delivery is best-effort: no failure from collection, DNS, or
//! transport ever reaches the caller, and the completion signal fires exactly
//! once per send that passes the idempotence check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::collector::{CollectError, SystemStatsProvider};
use crate::config::Config;
use crate::context::InvocationContext;
use crate::dns::DnsResolution;
use crate::process_state::ProcessState;
use crate::report::assembler::ReportAssembler;
use crate::report::document::{ReportDocument, ReportedError};
use crate::transport::Transport;

/// Receives the completion signal of a send.
pub type CompletionReceiver = oneshot::Receiver<()>;

/// Single-fire completion primitive handed to `send`.
///
/// Consumed by value when fired, so a second signal is unrepresentable. A
/// duplicate `send` drops its signal unfired; the paired receiver observes
/// the closed channel instead of a completion.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<()>,
}

impl CompletionSignal {
    /// Creates a signal and its paired receiver.
    pub fn channel() -> (Self, CompletionReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    fn fire(self) {
        let _ = self.tx.send(());
    }
}

/// Lookups started at construction, joined at send time.
struct InitialLookups {
    stat: JoinHandle<Result<crate::collector::ProcStatSample, CollectError>>,
    boot_id: JoinHandle<Result<String, CollectError>>,
}

/// The orchestrating state machine: `constructed → sending → settled`.
///
/// `settled` is terminal and reached exactly once; the `sent` flag flips
/// atomically at the start of `send`, before any async work, so reentrant or
/// concurrent duplicate calls are silent no-ops.
pub struct ReportLifecycle<P: SystemStatsProvider, T: Transport> {
    provider: Arc<P>,
    transport: Arc<T>,
    config: Arc<Config>,
    context: InvocationContext,
    start: Instant,
    sent: AtomicBool,
    report: Mutex<ReportDocument>,
    initial: Mutex<Option<InitialLookups>>,
    dns: Mutex<Option<DnsResolution>>,
}

impl<P: SystemStatsProvider, T: Transport> ReportLifecycle<P, T> {
    /// Builds the lifecycle for one invocation.
    ///
    /// Spawns the initial proc-stat and boot-id lookups immediately (so they
    /// overlap the invocation's own work), builds the report skeleton, and
    /// consumes the process coldstart flag. Never blocks. Must be called
    /// within a tokio runtime.
    pub fn new(
        provider: Arc<P>,
        transport: Arc<T>,
        config: Arc<Config>,
        context: InvocationContext,
        metrics: Vec<serde_json::Value>,
        dns: DnsResolution,
        state: &ProcessState,
    ) -> Arc<Self> {
        let stat = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.read_proc_stat().await }
        });
        let boot_id = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.read_boot_id().await }
        });

        let report = ReportAssembler::new(&config, &context, metrics, state);

        Arc::new(Self {
            provider,
            transport,
            config,
            context,
            start: Instant::now(),
            sent: AtomicBool::new(false),
            report: Mutex::new(report),
            initial: Mutex::new(Some(InitialLookups { stat, boot_id })),
            dns: Mutex::new(Some(dns)),
        })
    }

    /// Sends the report once.
    ///
    /// Synchronously, before any async work: checks-and-sets the sent flag
    /// (duplicate calls return immediately and never fire their completion),
    /// then merges `error` into the document if present. Delivery proceeds on
    /// a spawned task; `completion` fires exactly once when it settles,
    /// whether delivery succeeded or not.
    pub fn send(self: &Arc<Self>, error: Option<ReportedError>, completion: CompletionSignal) {
        if self
            .sent
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        if let Some(error) = error {
            let mut report = self.report.lock().unwrap();
            ReportAssembler::merge_error(&mut report, error);
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.deliver(completion).await;
        });
    }

    /// Whether `send` has already been accepted.
    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::SeqCst)
    }

    async fn deliver(&self, completion: CompletionSignal) {
        let initial = self.initial.lock().unwrap().take();

        // Four-way join: the two construction-time lookups plus two fresh
        // ones. Each is its own failure domain; a failed lookup degrades to
        // an absent field rather than holding the send hostage.
        let (stat_start, stat, status, boot_id) = match initial {
            Some(InitialLookups { stat, boot_id }) => {
                let (stat_start, stat_now, status, boot_id) = tokio::join!(
                    stat,
                    self.provider.read_proc_stat(),
                    self.provider.read_proc_status(),
                    boot_id,
                );
                (
                    settle_spawned(stat_start, "initial stat"),
                    settle(stat_now, "stat"),
                    settle(status, "status"),
                    settle_spawned(boot_id, "boot id"),
                )
            }
            None => (None, None, None, None),
        };

        let os = self.provider.os_snapshot();
        let container_id = self.provider.container_id();

        // Final merge; the document is frozen (cloned) afterwards.
        let document = {
            let mut report = self.report.lock().unwrap();
            ReportAssembler::merge_stats(
                &mut report,
                os,
                stat_start,
                stat,
                status,
                boot_id,
                container_id,
            );
            ReportAssembler::finalize_duration(&mut report, self.start.elapsed());
            if let Some(remaining) = self.context.remaining_time.as_ref() {
                report.invocation.remaining_time_in_millis = Some(remaining());
            }
            report.clone()
        };

        debug!(
            report = %serde_json::to_string(&document).unwrap_or_default(),
            "assembled report"
        );

        let dns = self
            .dns
            .lock()
            .unwrap()
            .take()
            .unwrap_or(DnsResolution::Unresolved);
        let resolved = match dns.wait().await {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(host = %self.config.host, error = %e, "report not delivered: DNS resolution failed");
                completion.fire();
                return;
            }
        };

        match self.transport.send(&document, &self.config, resolved).await {
            Ok(response) => {
                debug!(host = %self.config.host, status = response.status, body = %response.body, "collector response");
            }
            Err(e) => {
                // Log and swallow; delivery failures never block the host.
                debug!(host = %self.config.host, error = %e, "report not delivered");
            }
        }
        completion.fire();
    }
}

/// Collapses a construction-time lookup to an optional value.
fn settle_spawned<V>(
    joined: Result<Result<V, CollectError>, tokio::task::JoinError>,
    what: &str,
) -> Option<V> {
    match joined {
        Ok(result) => settle(result, what),
        Err(e) => {
            debug!(error = %e, "{what} lookup task failed");
            None
        }
    }
}

/// Collapses a send-time lookup to an optional value.
fn settle<V>(result: Result<V, CollectError>, what: &str) -> Option<V> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "{what} lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockFs, NoopStatsProvider, ProcfsStatsProvider};
    use crate::transport::{TransportError, TransportResponse};
    use std::net::IpAddr;
    use std::time::Duration;

    /// Records every delivery attempt; optionally fails them all.
    #[derive(Debug, Default)]
    struct MockTransport {
        requests: Mutex<Vec<ReportDocument>>,
        fail: bool,
    }

    impl MockTransport {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn attempts(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Transport for MockTransport {
        fn send(
            &self,
            document: &ReportDocument,
            _config: &Config,
            _resolved: Option<IpAddr>,
        ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
            let document = document.clone();
            async move {
                self.requests.lock().unwrap().push(document);
                if self.fail {
                    Err(TransportError::Serialize(serde_json::Error::io(
                        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed"),
                    )))
                } else {
                    Ok(TransportResponse {
                        status: 200,
                        body: "ok".to_string(),
                    })
                }
            }
        }
    }

    fn procfs_provider() -> Arc<ProcfsStatsProvider<MockFs>> {
        Arc::new(ProcfsStatsProvider::new(
            MockFs::serverless_sandbox(),
            "/proc",
        ))
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            client_id: Some("client-1".to_string()),
            host: "collector.example".to_string(),
            path: "/v0/report".to_string(),
            network_timeout: Duration::from_millis(3000),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_end_to_end_send() {
        let transport = Arc::new(MockTransport::default());
        let context = InvocationContext {
            function_name: Some("f1".to_string()),
            remaining_time: Some(Arc::new(|| 1500)),
            ..Default::default()
        };
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            context,
            vec![serde_json::json!({"name": "m", "value": 1})],
            DnsResolution::Unresolved,
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(None, done);
        finished.await.unwrap();

        assert_eq!(transport.attempts(), 1);
        let sent = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.client_id.as_deref(), Some("client-1"));
        assert!(sent.duration.unwrap() > 0);
        assert_eq!(sent.invocation.function_name.as_deref(), Some("f1"));
        assert_eq!(sent.invocation.remaining_time_in_millis, Some(1500));
        assert_eq!(
            sent.custom_metrics,
            vec![serde_json::json!({"name": "m", "value": 1})]
        );
        assert!(sent.errors.is_none());

        let os = sent.environment.os.as_ref().unwrap();
        assert_eq!(os.snapshot.hostname, "sandbox-3f2a");
        assert!(os.process.stat_start.is_some());
        assert!(os.process.stat.is_some());
        assert!(os.process.status.is_some());
        assert_eq!(
            sent.environment.host.boot_id.as_deref(),
            Some("f9d158c4-6d3b-4b6a-a2f5-0f1c7f0f6c11")
        );

        // Wire shape: the JSON body the collector sees.
        let body = serde_json::to_value(&sent).unwrap();
        assert_eq!(body["client_id"], "client-1");
        assert!(body["duration"].as_u64().unwrap() > 0);
        assert_eq!(body["custom_metrics"][0]["name"], "m");
        assert_eq!(body["coldstart"], true);
        assert_eq!(body["environment"]["agent"]["runtime"], "rust");
        assert_eq!(body["environment"]["os"]["hostname"], "sandbox-3f2a");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_send_is_a_noop() {
        let transport = Arc::new(MockTransport::default());
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &ProcessState::new(),
        );

        let (done1, finished1) = CompletionSignal::channel();
        let (done2, finished2) = CompletionSignal::channel();
        lifecycle.send(Some("boom".into()), done1);
        lifecycle.send(Some("boom".into()), done2);

        finished1.await.unwrap();
        // The duplicate's signal is dropped unfired.
        assert!(finished2.await.is_err());
        assert_eq!(transport.attempts(), 1);

        let sent = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.errors.as_ref().unwrap().message, "boom");
    }

    #[tokio::test]
    async fn test_transport_failure_still_completes() {
        let transport = Arc::new(MockTransport::failing());
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(None, done);
        finished.await.unwrap();
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_dns_failure_skips_delivery_but_completes() {
        let transport = Arc::new(MockTransport::default());
        let (tx, rx) = oneshot::channel();
        drop(tx); // resolution fails before producing an address
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Pending(rx),
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(None, done);
        finished.await.unwrap();
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade_to_partial_report() {
        let transport = Arc::new(MockTransport::default());
        let lifecycle = ReportLifecycle::new(
            Arc::new(NoopStatsProvider::new()),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(None, done);
        finished.await.unwrap();

        assert_eq!(transport.attempts(), 1);
        let sent = transport.requests.lock().unwrap()[0].clone();
        let os = sent.environment.os.as_ref().unwrap();
        assert!(os.process.stat_start.is_none());
        assert!(os.process.stat.is_none());
        assert!(os.process.status.is_none());
        assert!(sent.environment.host.boot_id.is_none());
        assert!(sent.duration.is_some());
    }

    #[tokio::test]
    async fn test_string_error_is_recorded_with_stack() {
        let transport = Arc::new(MockTransport::default());
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(Some("boom".into()), done);
        finished.await.unwrap();

        let sent = transport.requests.lock().unwrap()[0].clone();
        let record = sent.errors.as_ref().unwrap();
        assert_eq!(record.name, "Error");
        assert_eq!(record.message, "boom");
        assert!(!record.stack.as_deref().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_coldstart_across_lifecycles() {
        let state = ProcessState::new();
        let transport = Arc::new(MockTransport::default());

        let first = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &state,
        );
        let second = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Unresolved,
            &state,
        );

        // Send in reverse construction order; coldstart follows construction.
        let (done2, finished2) = CompletionSignal::channel();
        second.send(None, done2);
        finished2.await.unwrap();
        let (done1, finished1) = CompletionSignal::channel();
        first.send(None, done1);
        finished1.await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert!(!requests[0].coldstart); // second-constructed, sent first
        assert!(requests[1].coldstart); // first-constructed, sent second
    }

    #[tokio::test]
    async fn test_resolved_address_reaches_transport() {
        #[derive(Debug, Default)]
        struct AddrRecorder {
            seen: Mutex<Option<Option<IpAddr>>>,
        }
        impl Transport for AddrRecorder {
            fn send(
                &self,
                _document: &ReportDocument,
                _config: &Config,
                resolved: Option<IpAddr>,
            ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
                *self.seen.lock().unwrap() = Some(resolved);
                async {
                    Ok(TransportResponse {
                        status: 201,
                        body: String::new(),
                    })
                }
            }
        }

        let transport = Arc::new(AddrRecorder::default());
        let ip: IpAddr = "203.0.113.9".parse().unwrap();
        let lifecycle = ReportLifecycle::new(
            procfs_provider(),
            Arc::clone(&transport),
            test_config(),
            InvocationContext::default(),
            Vec::new(),
            DnsResolution::Ready(ip),
            &ProcessState::new(),
        );

        let (done, finished) = CompletionSignal::channel();
        lifecycle.send(None, done);
        finished.await.unwrap();
        assert_eq!(*transport.seen.lock().unwrap(), Some(Some(ip)));
    }
}
