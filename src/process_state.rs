//! Process-scoped state shared by every report the process produces.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use uuid::Uuid;

/// Process-wide instance, created on first access.
static GLOBAL: LazyLock<ProcessState> = LazyLock::new(ProcessState::new);

/// Identity and coldstart state for the current process.
///
/// Injected into report construction rather than read from ambient globals,
/// so the lifecycle stays testable without real process state. The coldstart
/// flag starts `true` and flips to `false` exactly once, at the first report
/// construction — not at first send.
#[derive(Debug)]
pub struct ProcessState {
    process_id: String,
    version: &'static str,
    load_time: i64,
    coldstart: AtomicBool,
}

impl ProcessState {
    /// Creates fresh state with a new process id and the coldstart flag set.
    pub fn new() -> Self {
        Self {
            process_id: Uuid::new_v4().to_string(),
            version: crate::VERSION,
            load_time: Utc::now().timestamp_millis(),
            coldstart: AtomicBool::new(true),
        }
    }

    /// The shared process-wide instance.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Process identifier, constant for the agent's lifetime.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Agent version.
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// When this state was created, in epoch milliseconds.
    pub fn load_time(&self) -> i64 {
        self.load_time
    }

    /// Returns the current coldstart value and clears it.
    ///
    /// The swap is atomic so the true→false transition happens exactly once
    /// even under concurrent invocations.
    pub fn consume_coldstart(&self) -> bool {
        self.coldstart.swap(false, Ordering::SeqCst)
    }

    /// Reads the coldstart flag without clearing it.
    pub fn is_coldstart(&self) -> bool {
        self.coldstart.load(Ordering::SeqCst)
    }
}

impl Default for ProcessState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coldstart_flips_once() {
        let state = ProcessState::new();
        assert!(state.is_coldstart());
        assert!(state.consume_coldstart());
        assert!(!state.consume_coldstart());
        assert!(!state.is_coldstart());
    }

    #[test]
    fn test_process_id_is_stable() {
        let state = ProcessState::new();
        assert_eq!(state.process_id(), state.process_id());
        assert!(!state.process_id().is_empty());
    }

    #[test]
    fn test_distinct_states_get_distinct_ids() {
        let a = ProcessState::new();
        let b = ProcessState::new();
        assert_ne!(a.process_id(), b.process_id());
    }
}
