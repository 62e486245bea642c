//! # Context Settings
//!
//! Thread-safe, mutable settings for one service client context.
//!
//! A [`ContextSettings`] holds the timeout and retry policy consulted by the
//! HTTP layer, a handful of feature toggles, two irreversible developer
//! overrides, and the registry of observers notified whenever the client routes
//! a service call.
//!
//! ## Quick Start
//!
//! ```rust
//! use context_settings::{ContextSettings, ServiceCallRoutedEvent, ThrottleSetting};
//! use std::time::Duration;
//!
//! let settings = ContextSettings::new();
//! settings.set_http_retry_delay(Duration::ZERO);
//! assert_eq!(settings.http_retry_delay(), Duration::from_secs(2)); // floor
//!
//! let id = settings.add_service_call_routed_handler(|event| {
//!     println!("routed {}", event);
//! });
//! settings.raise_service_call_routed_event(&ServiceCallRoutedEvent::new(1, "GET", "/titles"));
//! settings.remove_service_call_routed_handler(id);
//!
//! settings.disable_asserts_for_throttling_in_dev_sandboxes(
//!     ThrottleSetting::ThisCodeNeedsToBeChangedToAvoidThrottling,
//! );
//! assert!(settings.is_throttling_assert_disabled());
//! ```
//!
//! ## Features
//!
//! - **Lock-free settings**: every timeout and flag is an atomic
//! - **Ordered observers**: handlers run in registration order under one lock
//! - **Observer isolation**: a panicking handler is logged and skipped
//! - **Shared diagnostics**: trace level lives in an injectable [`ServicesSettings`]
//! - **File configuration**: [`SettingsConfig`] loads from TOML

mod atomic_duration;
mod config;
mod dispatcher;
mod handler_registry;
mod routed_event;
mod services_settings;
mod settings;
mod settings_error;

pub use config::SettingsConfig;
pub use dispatcher::{Dispatcher, InlineDispatcher};
pub use handler_registry::{HandlerId, HandlerRegistry, RoutedHandler};
pub use routed_event::ServiceCallRoutedEvent;
pub use services_settings::{
    DiagnosticsSettings, ServicesSettings, SingletonServicesSettings, TraceLevel,
};
pub use settings::{
    ContextSettings, RecommendedSetting, ThrottleSetting, DEFAULT_HTTP_RETRY_WINDOW_SECONDS,
    DEFAULT_HTTP_TIMEOUT_SECONDS, DEFAULT_LONG_HTTP_TIMEOUT_SECONDS, DEFAULT_RETRY_DELAY_SECONDS,
    DEFAULT_WEBSOCKET_TIMEOUT_SECONDS, MIN_RETRY_DELAY_SECONDS,
};
pub use settings_error::SettingsError;
