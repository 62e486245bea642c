use std::fmt;
use std::time::Duration;

/// Describes one service call routed by the SDK.
///
/// Passed by reference to every handler registered through
/// [`ContextSettings::add_service_call_routed_handler`](crate::ContextSettings::add_service_call_routed_handler).
/// The settings object never inspects these fields; they are data for observers.
///
/// # Examples
///
/// ```rust
/// use context_settings::ServiceCallRoutedEvent;
///
/// let event = ServiceCallRoutedEvent::new(7, "GET", "https://profile.example.com/users/me")
///     .with_http_status(200);
/// println!("{}", event);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCallRoutedEvent {
    /// Opaque identifier of the call, assigned by the caller.
    pub call_id: u64,
    pub http_method: String,
    pub uri: String,
    /// Zero when no response was received.
    pub http_status: u16,
    pub request_body: String,
    pub response_body: String,
    pub elapsed: Duration,
    /// Number of retries performed before this result.
    pub retry_count: u32,
}

impl ServiceCallRoutedEvent {
    pub fn new(call_id: u64, http_method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            call_id,
            http_method: http_method.into(),
            uri: uri.into(),
            http_status: 0,
            request_body: String::new(),
            response_body: String::new(),
            elapsed: Duration::ZERO,
            retry_count: 0,
        }
    }

    pub fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = http_status;
        self
    }

    pub fn with_request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = body.into();
        self
    }

    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = body.into();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

impl fmt::Display for ServiceCallRoutedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} ({}ms)",
            self.call_id,
            self.http_method,
            self.uri,
            self.http_status,
            self.elapsed.as_millis()
        )
    }
}
