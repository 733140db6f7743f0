//! Invocation context supplied by the host environment.

use std::fmt;
use std::sync::Arc;

/// Callback that reports how many milliseconds the invocation has left.
///
/// Supplied by host environments that expose a deadline; resolved once at
/// send time.
pub type RemainingTimeFn = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Metadata describing the current invocation.
///
/// Every field is optional; hosts populate whatever they know. The struct is
/// read-only as far as the reporter is concerned.
#[derive(Clone, Default)]
pub struct InvocationContext {
    pub function_name: Option<String>,
    pub function_version: Option<String>,
    pub request_id: Option<String>,
    pub invoked_function_arn: Option<String>,
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
    pub memory_limit_in_mb: Option<u32>,
    pub trace_id: Option<String>,
    /// Deadline capability; absent when the host has no notion of one.
    pub remaining_time: Option<RemainingTimeFn>,
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("function_name", &self.function_name)
            .field("function_version", &self.function_version)
            .field("request_id", &self.request_id)
            .field("invoked_function_arn", &self.invoked_function_arn)
            .field("log_group_name", &self.log_group_name)
            .field("log_stream_name", &self.log_stream_name)
            .field("memory_limit_in_mb", &self.memory_limit_in_mb)
            .field("trace_id", &self.trace_id)
            .field("remaining_time", &self.remaining_time.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_empty() {
        let context = InvocationContext::default();
        assert!(context.function_name.is_none());
        assert!(context.remaining_time.is_none());
    }

    #[test]
    fn test_remaining_time_capability() {
        let context = InvocationContext {
            remaining_time: Some(Arc::new(|| 2500)),
            ..Default::default()
        };
        let remaining = context.remaining_time.as_ref().map(|f| f());
        assert_eq!(remaining, Some(2500));
    }
}
