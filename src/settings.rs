//! Per-context settings for the service client.
//!
//! One [`ContextSettings`] is created with each SDK client context and lives as
//! long as that context. It carries:
//!
//! - timeout and retry policy values consulted by the HTTP and websocket layers,
//! - feature toggles and two irreversible developer overrides,
//! - the registry of service-call-routed observers,
//! - a forwarding surface for the process-wide diagnostics trace level.
//!
//! # Concurrency
//!
//! Configuration fields are individual atomics: every read and write is safe from
//! any thread, but there is no ordering between different fields and concurrent
//! writers of the same field race with last-writer-wins semantics. The observer
//! registry is guarded by its own lock (see [`HandlerRegistry`]).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::atomic_duration::AtomicDuration;
use crate::{
    DiagnosticsSettings, Dispatcher, HandlerId, HandlerRegistry, RoutedHandler,
    ServiceCallRoutedEvent, SingletonServicesSettings, TraceLevel,
};

pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_LONG_HTTP_TIMEOUT_SECONDS: u64 = 5 * 60;
pub const DEFAULT_WEBSOCKET_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 2;
pub const DEFAULT_HTTP_RETRY_WINDOW_SECONDS: u64 = 20;
/// Lower bound applied to every retry delay written through [`ContextSettings::set_http_retry_delay`].
pub const MIN_RETRY_DELAY_SECONDS: u64 = 2;

/// Token for [`ContextSettings::disable_asserts_for_throttling_in_dev_sandboxes`].
///
/// Only [`ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling`] has an effect;
/// the name makes the override visible at the call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThrottleSetting {
    #[default]
    Enforce,
    ThisCodeNeedsToBeChangedToAvoidThrottling,
}

/// Token for [`ContextSettings::disable_asserts_for_max_websockets_activated`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecommendedSetting {
    #[default]
    Enforce,
    ThisCodeNeedsToBeChangedToFollowBestPractices,
}

/// Thread-safe settings owned by one SDK client context.
///
/// # Examples
///
/// ```rust
/// use context_settings::{ContextSettings, ServiceCallRoutedEvent};
/// use std::time::Duration;
///
/// let settings = ContextSettings::new();
/// settings.set_http_timeout(Duration::from_secs(10));
/// settings.set_enable_service_call_routed_events(true);
///
/// let id = settings.add_service_call_routed_handler(|event| println!("{}", event));
///
/// // Done by the HTTP layer once per routed call.
/// if settings.enable_service_call_routed_events() {
///     settings.raise_service_call_routed_event(&ServiceCallRoutedEvent::new(1, "GET", "/"));
/// }
///
/// settings.remove_service_call_routed_handler(id);
/// ```
pub struct ContextSettings {
    enable_service_call_routed_events: AtomicBool,
    http_timeout: AtomicDuration,
    long_http_timeout: AtomicDuration,
    websocket_timeout_window: AtomicDuration,
    http_retry_delay: AtomicDuration,
    http_timeout_window: AtomicDuration,
    use_core_dispatcher_for_event_routing: AtomicBool,
    disable_throttling_asserts: AtomicBool,
    disable_max_websockets_assert: AtomicBool,
    handlers: HandlerRegistry,
    services: Arc<dyn DiagnosticsSettings>,
    dispatcher: Mutex<Option<Arc<dyn Dispatcher>>>,
}

impl ContextSettings {
    /// Settings with documented defaults, forwarding diagnostics to whichever
    /// process-wide [`ServicesSettings`](crate::ServicesSettings) instance is
    /// current at the time of each call.
    pub fn new() -> Self {
        Self::with_services_settings(Arc::new(SingletonServicesSettings))
    }

    /// Settings with documented defaults, forwarding diagnostics to `services`.
    pub fn with_services_settings(services: Arc<dyn DiagnosticsSettings>) -> Self {
        Self {
            enable_service_call_routed_events: AtomicBool::new(false),
            http_timeout: AtomicDuration::new(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)),
            long_http_timeout: AtomicDuration::new(Duration::from_secs(
                DEFAULT_LONG_HTTP_TIMEOUT_SECONDS,
            )),
            websocket_timeout_window: AtomicDuration::new(Duration::from_secs(
                DEFAULT_WEBSOCKET_TIMEOUT_SECONDS,
            )),
            http_retry_delay: AtomicDuration::new(Duration::from_secs(DEFAULT_RETRY_DELAY_SECONDS)),
            http_timeout_window: AtomicDuration::new(Duration::from_secs(
                DEFAULT_HTTP_RETRY_WINDOW_SECONDS,
            )),
            use_core_dispatcher_for_event_routing: AtomicBool::new(false),
            disable_throttling_asserts: AtomicBool::new(false),
            disable_max_websockets_assert: AtomicBool::new(false),
            handlers: HandlerRegistry::new(),
            services,
            dispatcher: Mutex::new(None),
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Service call routed events
    // -------------------------------------------------------------------------------------------------

    /// Whether the HTTP layer should build and raise routed events.
    ///
    /// Advisory only: [`raise_service_call_routed_event`](Self::raise_service_call_routed_event)
    /// notifies handlers regardless of this flag.
    pub fn enable_service_call_routed_events(&self) -> bool {
        self.enable_service_call_routed_events.load(Ordering::Relaxed)
    }

    pub fn set_enable_service_call_routed_events(&self, value: bool) {
        self.enable_service_call_routed_events.store(value, Ordering::Relaxed);
        debug!(value, "enable_service_call_routed_events set");
    }

    /// Register an observer. See [`HandlerRegistry::subscribe`].
    pub fn add_service_call_routed_handler(
        &self,
        handler: impl Fn(&ServiceCallRoutedEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.handlers.subscribe(handler)
    }

    /// Register an optional observer; `None` yields [`HandlerId::INVALID`].
    pub fn add_service_call_routed_handler_opt(
        &self,
        handler: Option<Arc<RoutedHandler>>,
    ) -> HandlerId {
        self.handlers.add_handler(handler)
    }

    pub fn remove_service_call_routed_handler(&self, id: HandlerId) {
        self.handlers.remove_handler(id)
    }

    /// Notify every registered observer of `event`, synchronously and in registration order.
    ///
    /// Observers run while the handler lock is held and must not call back into
    /// the handler methods of this settings object. `Debug` formatting of the
    /// settings does not take that lock and is safe from inside an observer.
    pub fn raise_service_call_routed_event(&self, event: &ServiceCallRoutedEvent) {
        self.handlers.raise(event)
    }

    pub fn service_call_routed_handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    // -------------------------------------------------------------------------------------------------
    // Timeouts and retry policy
    // -------------------------------------------------------------------------------------------------

    /// Timeout for a single HTTP request.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout.load()
    }

    pub fn set_http_timeout(&self, value: Duration) {
        self.http_timeout.store(value);
        debug!(?value, "http_timeout set");
    }

    /// Timeout for calls known to be long running.
    pub fn long_http_timeout(&self) -> Duration {
        self.long_http_timeout.load()
    }

    pub fn set_long_http_timeout(&self, value: Duration) {
        self.long_http_timeout.store(value);
        debug!(?value, "long_http_timeout set");
    }

    /// How long a websocket may stay disconnected before the connection is considered lost.
    pub fn websocket_timeout_window(&self) -> Duration {
        self.websocket_timeout_window.load()
    }

    pub fn set_websocket_timeout_window(&self, value: Duration) {
        self.websocket_timeout_window.store(value);
        debug!(?value, "websocket_timeout_window set");
    }

    /// Delay between HTTP retries. Never below [`MIN_RETRY_DELAY_SECONDS`].
    pub fn http_retry_delay(&self) -> Duration {
        self.http_retry_delay.load()
    }

    /// Values below [`MIN_RETRY_DELAY_SECONDS`] are raised to it.
    pub fn set_http_retry_delay(&self, value: Duration) {
        let clamped = value.max(Duration::from_secs(MIN_RETRY_DELAY_SECONDS));
        self.http_retry_delay.store(clamped);
        debug!(requested = ?value, stored = ?clamped, "http_retry_delay set");
    }

    /// Total time budget across all retries of one call.
    pub fn http_timeout_window(&self) -> Duration {
        self.http_timeout_window.load()
    }

    pub fn set_http_timeout_window(&self, value: Duration) {
        self.http_timeout_window.store(value);
        debug!(?value, "http_timeout_window set");
    }

    // -------------------------------------------------------------------------------------------------
    // Dispatcher
    // -------------------------------------------------------------------------------------------------

    pub fn use_core_dispatcher_for_event_routing(&self) -> bool {
        self.use_core_dispatcher_for_event_routing.load(Ordering::Relaxed)
    }

    pub fn set_use_core_dispatcher_for_event_routing(&self, value: bool) {
        self.use_core_dispatcher_for_event_routing.store(value, Ordering::Relaxed);
        debug!(value, "use_core_dispatcher_for_event_routing set");
    }

    /// Install or clear the host dispatcher.
    ///
    /// When a dispatcher is installed, `on_attach` (typically a locale refresh) is
    /// scheduled on it. Passing `None` clears the current dispatcher and schedules nothing.
    pub fn set_dispatcher(
        &self,
        dispatcher: Option<Arc<dyn Dispatcher>>,
        on_attach: impl FnOnce() + Send + 'static,
    ) {
        let mut slot = self.dispatcher.lock().unwrap_or_else(|p| p.into_inner());
        *slot = dispatcher.clone();
        drop(slot);

        match dispatcher {
            Some(dispatcher) => {
                debug!("dispatcher installed");
                dispatcher.run_async(Box::new(on_attach));
            }
            None => debug!("dispatcher cleared"),
        }
    }

    pub fn dispatcher(&self) -> Option<Arc<dyn Dispatcher>> {
        self.dispatcher
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    // -------------------------------------------------------------------------------------------------
    // Developer overrides
    // -------------------------------------------------------------------------------------------------

    /// Stop asserting on throttled calls in development sandboxes.
    ///
    /// Only [`ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling`] takes effect.
    /// There is no way to turn the assert back on for this context.
    pub fn disable_asserts_for_throttling_in_dev_sandboxes(&self, setting: ThrottleSetting) {
        if setting == ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling {
            self.disable_throttling_asserts.store(true, Ordering::Relaxed);
            debug!("throttling asserts disabled");
        }
    }

    pub fn is_throttling_assert_disabled(&self) -> bool {
        self.disable_throttling_asserts.load(Ordering::Relaxed)
    }

    /// Stop asserting when the maximum number of websockets is activated.
    ///
    /// Only [`RecommendedSetting::ThisCodeNeedsToBeChangedToFollowBestPractices`] takes
    /// effect. There is no way to turn the assert back on for this context.
    pub fn disable_asserts_for_max_websockets_activated(&self, setting: RecommendedSetting) {
        if setting == RecommendedSetting::ThisCodeNeedsToBeChangedToFollowBestPractices {
            self.disable_max_websockets_assert.store(true, Ordering::Relaxed);
            debug!("max websockets asserts disabled");
        }
    }

    pub fn is_max_websockets_assert_disabled(&self) -> bool {
        self.disable_max_websockets_assert.load(Ordering::Relaxed)
    }

    // -------------------------------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------------------------------

    /// Reads the shared trace level. Not cached locally.
    pub fn diagnostics_trace_level(&self) -> TraceLevel {
        self.services.diagnostics_trace_level()
    }

    /// Writes the shared trace level; visible to every context sharing the same services settings.
    pub fn set_diagnostics_trace_level(&self, level: TraceLevel) {
        self.services.set_diagnostics_trace_level(level)
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContextSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSettings")
            .field(
                "enable_service_call_routed_events",
                &self.enable_service_call_routed_events(),
            )
            .field("http_timeout", &self.http_timeout())
            .field("long_http_timeout", &self.long_http_timeout())
            .field("websocket_timeout_window", &self.websocket_timeout_window())
            .field("http_retry_delay", &self.http_retry_delay())
            .field("http_timeout_window", &self.http_timeout_window())
            .field(
                "use_core_dispatcher_for_event_routing",
                &self.use_core_dispatcher_for_event_routing(),
            )
            .field(
                "disable_throttling_asserts",
                &self.is_throttling_assert_disabled(),
            )
            .field(
                "disable_max_websockets_assert",
                &self.is_max_websockets_assert_disabled(),
            )
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InlineDispatcher, ServicesSettings};
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;

    fn isolated() -> ContextSettings {
        ContextSettings::with_services_settings(Arc::new(ServicesSettings::new()))
    }

    #[test]
    fn test_defaults() {
        let s = isolated();
        assert!(!s.enable_service_call_routed_events());
        assert_eq!(s.http_timeout(), Duration::from_secs(30));
        assert_eq!(s.long_http_timeout(), Duration::from_secs(300));
        assert_eq!(s.websocket_timeout_window(), Duration::from_secs(300));
        assert_eq!(s.http_retry_delay(), Duration::from_secs(2));
        assert_eq!(s.http_timeout_window(), Duration::from_secs(20));
        assert!(!s.use_core_dispatcher_for_event_routing());
        assert!(!s.is_throttling_assert_disabled());
        assert!(!s.is_max_websockets_assert_disabled());
        assert!(s.service_call_routed_handlers().is_empty());
        assert!(s.dispatcher().is_none());
    }

    #[test]
    fn test_retry_delay_floor() {
        let s = isolated();

        s.set_http_retry_delay(Duration::ZERO);
        assert_eq!(
            s.http_retry_delay(),
            Duration::from_secs(MIN_RETRY_DELAY_SECONDS)
        );

        s.set_http_retry_delay(Duration::from_millis(1999));
        assert_eq!(s.http_retry_delay(), Duration::from_secs(2));

        s.set_http_retry_delay(Duration::from_secs(10));
        assert_eq!(s.http_retry_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_plain_setters_store_as_is() {
        let s = isolated();

        s.set_http_timeout(Duration::ZERO);
        s.set_long_http_timeout(Duration::from_secs(600));
        s.set_websocket_timeout_window(Duration::from_millis(250));
        s.set_http_timeout_window(Duration::from_secs(1));
        s.set_enable_service_call_routed_events(true);
        s.set_use_core_dispatcher_for_event_routing(true);

        assert_eq!(s.http_timeout(), Duration::ZERO);
        assert_eq!(s.long_http_timeout(), Duration::from_secs(600));
        assert_eq!(s.websocket_timeout_window(), Duration::from_millis(250));
        // No cross-field validation: window may be shorter than the retry delay.
        assert_eq!(s.http_timeout_window(), Duration::from_secs(1));
        assert!(s.enable_service_call_routed_events());
        assert!(s.use_core_dispatcher_for_event_routing());
    }

    #[test]
    fn test_throttling_override_is_one_way() {
        let s = isolated();

        s.disable_asserts_for_throttling_in_dev_sandboxes(ThrottleSetting::Enforce);
        assert!(!s.is_throttling_assert_disabled());

        s.disable_asserts_for_throttling_in_dev_sandboxes(
            ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling,
        );
        assert!(s.is_throttling_assert_disabled());

        s.disable_asserts_for_throttling_in_dev_sandboxes(ThrottleSetting::Enforce);
        assert!(s.is_throttling_assert_disabled());
        s.disable_asserts_for_throttling_in_dev_sandboxes(
            ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling,
        );
        assert!(s.is_throttling_assert_disabled());

        // Independent of the websocket override.
        assert!(!s.is_max_websockets_assert_disabled());
    }

    #[test]
    fn test_max_websockets_override_is_one_way() {
        let s = isolated();

        s.disable_asserts_for_max_websockets_activated(RecommendedSetting::default());
        assert!(!s.is_max_websockets_assert_disabled());

        s.disable_asserts_for_max_websockets_activated(
            RecommendedSetting::ThisCodeNeedsToBeChangedToFollowBestPractices,
        );
        assert!(s.is_max_websockets_assert_disabled());

        s.disable_asserts_for_max_websockets_activated(RecommendedSetting::Enforce);
        assert!(s.is_max_websockets_assert_disabled());
        assert!(!s.is_throttling_assert_disabled());
    }

    #[test]
    fn test_raise_ignores_enable_flag() {
        let s = isolated();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        s.add_service_call_routed_handler(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!s.enable_service_call_routed_events());
        s.raise_service_call_routed_event(&ServiceCallRoutedEvent::new(1, "GET", "/"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_surface() {
        let s = isolated();
        assert_eq!(
            s.add_service_call_routed_handler_opt(None),
            HandlerId::INVALID
        );

        let id = s.add_service_call_routed_handler(|_| {});
        assert_eq!(id.value(), 0);
        s.remove_service_call_routed_handler(id);
        s.remove_service_call_routed_handler(id);
        assert!(s.service_call_routed_handlers().is_empty());
    }

    #[test]
    fn test_diagnostics_forwarding_to_injected_settings() {
        let services = Arc::new(ServicesSettings::new());
        let a = ContextSettings::with_services_settings(services.clone());
        let b = ContextSettings::with_services_settings(services.clone());

        a.set_diagnostics_trace_level(TraceLevel::Warning);
        assert_eq!(services.diagnostics_trace_level(), TraceLevel::Warning);
        assert_eq!(b.diagnostics_trace_level(), TraceLevel::Warning);

        services.set_diagnostics_trace_level(TraceLevel::Info);
        assert_eq!(a.diagnostics_trace_level(), TraceLevel::Info);
    }

    #[test]
    #[serial]
    fn test_new_forwards_to_singleton() {
        ServicesSettings::reset_singleton_instance();

        let s = ContextSettings::new();
        s.set_diagnostics_trace_level(TraceLevel::Verbose);
        assert_eq!(
            ServicesSettings::get_singleton_instance().diagnostics_trace_level(),
            TraceLevel::Verbose
        );

        ServicesSettings::reset_singleton_instance();
    }

    #[test]
    #[serial]
    fn test_default_context_follows_singleton_reset() {
        ServicesSettings::reset_singleton_instance();

        let before = ContextSettings::new();
        before.set_diagnostics_trace_level(TraceLevel::Error);

        ServicesSettings::reset_singleton_instance();
        assert_eq!(before.diagnostics_trace_level(), TraceLevel::Off);

        let after = ContextSettings::new();
        after.set_diagnostics_trace_level(TraceLevel::Verbose);
        assert_eq!(before.diagnostics_trace_level(), TraceLevel::Verbose);

        before.set_diagnostics_trace_level(TraceLevel::Info);
        assert_eq!(after.diagnostics_trace_level(), TraceLevel::Info);

        ServicesSettings::reset_singleton_instance();
    }

    #[test]
    fn test_set_dispatcher_schedules_refresh() {
        let s = isolated();
        let refreshed = Arc::new(AtomicUsize::new(0));

        let r = refreshed.clone();
        s.set_dispatcher(Some(Arc::new(InlineDispatcher)), move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
        assert!(s.dispatcher().is_some());

        let r = refreshed.clone();
        s.set_dispatcher(None, move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
        assert!(s.dispatcher().is_none());
        // Installing a dispatcher does not flip the advisory routing flag.
        assert!(!s.use_core_dispatcher_for_event_routing());
    }

    #[test]
    fn test_debug_format() {
        let s = isolated();
        let rendered = format!("{:?}", s);
        assert!(rendered.starts_with("ContextSettings {"));
        assert!(rendered.contains("http_timeout: 30s"));
        assert!(!rendered.contains("handlers"));
    }

    #[test]
    fn test_debug_format_inside_handler() {
        let s = Arc::new(isolated());
        let rendered = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&s);
        let sink = rendered.clone();
        s.add_service_call_routed_handler(move |_| {
            if let Some(settings) = weak.upgrade() {
                sink.lock().unwrap().push(format!("{:?}", settings));
            }
        });

        s.raise_service_call_routed_event(&ServiceCallRoutedEvent::new(4, "GET", "/"));

        let rendered = rendered.lock().unwrap();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].starts_with("ContextSettings {"));
    }
}
