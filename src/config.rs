//! File-based configuration for [`ContextSettings`].
//!
//! ```toml
//! enable_service_call_routed_events = true
//! http_timeout_secs = 15
//! http_retry_delay_secs = 5
//! diagnostics_trace_level = "warning"
//! ```
//!
//! Missing keys take the documented defaults. The developer override gates are
//! intentionally absent: they can only be flipped in code.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::settings::{
    DEFAULT_HTTP_RETRY_WINDOW_SECONDS, DEFAULT_HTTP_TIMEOUT_SECONDS,
    DEFAULT_LONG_HTTP_TIMEOUT_SECONDS, DEFAULT_RETRY_DELAY_SECONDS,
    DEFAULT_WEBSOCKET_TIMEOUT_SECONDS,
};
use crate::{ContextSettings, SettingsError, TraceLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    pub enable_service_call_routed_events: bool,
    pub http_timeout_secs: u64,
    pub long_http_timeout_secs: u64,
    pub websocket_timeout_window_secs: u64,
    pub http_retry_delay_secs: u64,
    pub http_timeout_window_secs: u64,
    pub use_core_dispatcher_for_event_routing: bool,
    /// `None` leaves the shared trace level untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_trace_level: Option<TraceLevel>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            enable_service_call_routed_events: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECONDS,
            long_http_timeout_secs: DEFAULT_LONG_HTTP_TIMEOUT_SECONDS,
            websocket_timeout_window_secs: DEFAULT_WEBSOCKET_TIMEOUT_SECONDS,
            http_retry_delay_secs: DEFAULT_RETRY_DELAY_SECONDS,
            http_timeout_window_secs: DEFAULT_HTTP_RETRY_WINDOW_SECONDS,
            use_core_dispatcher_for_event_routing: false,
            diagnostics_trace_level: None,
        }
    }
}

impl SettingsConfig {
    pub fn from_toml(input: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }
}

impl ContextSettings {
    /// Build settings from `config`, forwarding diagnostics to the process-wide instance.
    pub fn from_config(config: &SettingsConfig) -> Self {
        let settings = Self::new();
        settings.apply_config(config);
        settings
    }

    /// Write every configured value through the regular setters, so the retry
    /// delay floor still applies.
    pub fn apply_config(&self, config: &SettingsConfig) {
        self.set_enable_service_call_routed_events(config.enable_service_call_routed_events);
        self.set_http_timeout(Duration::from_secs(config.http_timeout_secs));
        self.set_long_http_timeout(Duration::from_secs(config.long_http_timeout_secs));
        self.set_websocket_timeout_window(Duration::from_secs(
            config.websocket_timeout_window_secs,
        ));
        self.set_http_retry_delay(Duration::from_secs(config.http_retry_delay_secs));
        self.set_http_timeout_window(Duration::from_secs(config.http_timeout_window_secs));
        self.set_use_core_dispatcher_for_event_routing(
            config.use_core_dispatcher_for_event_routing,
        );
        if let Some(level) = config.diagnostics_trace_level {
            self.set_diagnostics_trace_level(level);
        }
        debug!("settings config applied");
    }

    /// Current values as a config. Durations are truncated to whole seconds.
    pub fn snapshot(&self) -> SettingsConfig {
        SettingsConfig {
            enable_service_call_routed_events: self.enable_service_call_routed_events(),
            http_timeout_secs: self.http_timeout().as_secs(),
            long_http_timeout_secs: self.long_http_timeout().as_secs(),
            websocket_timeout_window_secs: self.websocket_timeout_window().as_secs(),
            http_retry_delay_secs: self.http_retry_delay().as_secs(),
            http_timeout_window_secs: self.http_timeout_window().as_secs(),
            use_core_dispatcher_for_event_routing: self.use_core_dispatcher_for_event_routing(),
            diagnostics_trace_level: Some(self.diagnostics_trace_level()),
        }
    }
}
