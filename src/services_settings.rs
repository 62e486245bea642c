//! Process-wide diagnostics settings shared by every SDK context.
//!
//! [`ServicesSettings`] owns the diagnostics trace level. A single instance is
//! created lazily on first access and lives until [`ServicesSettings::reset_singleton_instance`]
//! tears it down. Contexts depend on it only through [`DiagnosticsSettings`]: by
//! default through [`SingletonServicesSettings`], which resolves the current
//! instance on every call, or through an instance injected by tests and hosts.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing::level_filters::LevelFilter;

use crate::SettingsError;

/// Verbosity of SDK diagnostics output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TraceLevel {
    #[default]
    Off = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Verbose = 4,
}

impl TraceLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TraceLevel::Error,
            2 => TraceLevel::Warning,
            3 => TraceLevel::Info,
            4 => TraceLevel::Verbose,
            _ => TraceLevel::Off,
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceLevel::Off => "off",
            TraceLevel::Error => "error",
            TraceLevel::Warning => "warning",
            TraceLevel::Info => "info",
            TraceLevel::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

impl FromStr for TraceLevel {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(TraceLevel::Off),
            "error" => Ok(TraceLevel::Error),
            "warning" | "warn" => Ok(TraceLevel::Warning),
            "info" => Ok(TraceLevel::Info),
            "verbose" => Ok(TraceLevel::Verbose),
            _ => Err(SettingsError::UnknownTraceLevel(s.to_string())),
        }
    }
}

impl From<TraceLevel> for LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => LevelFilter::OFF,
            TraceLevel::Error => LevelFilter::ERROR,
            TraceLevel::Warning => LevelFilter::WARN,
            TraceLevel::Info => LevelFilter::INFO,
            TraceLevel::Verbose => LevelFilter::TRACE,
        }
    }
}

/// Narrow interface through which a context reads and writes the shared trace level.
pub trait DiagnosticsSettings: Send + Sync {
    fn diagnostics_trace_level(&self) -> TraceLevel;

    fn set_diagnostics_trace_level(&self, level: TraceLevel);
}

/// Shared diagnostics state.
#[derive(Debug, Default)]
pub struct ServicesSettings {
    trace_level: AtomicU8,
}

/// Holds the lazily created process-wide instance.
static SINGLETON: LazyLock<Mutex<Option<Arc<ServicesSettings>>>> =
    LazyLock::new(|| Mutex::new(None));

impl ServicesSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide instance, creating it on first use.
    ///
    /// # Lock Poisoning Recovery
    ///
    /// The slot only ever holds `None` or a complete instance, so a poisoned
    /// lock is recovered rather than propagated.
    pub fn get_singleton_instance() -> Arc<ServicesSettings> {
        let mut slot = SINGLETON.lock().unwrap_or_else(|p| p.into_inner());
        slot.get_or_insert_with(|| {
            debug!("creating services settings singleton");
            Arc::new(ServicesSettings::new())
        })
        .clone()
    }

    /// Drops the process-wide instance. The next access creates a fresh one with defaults.
    pub fn reset_singleton_instance() {
        let mut slot = SINGLETON.lock().unwrap_or_else(|p| p.into_inner());
        if slot.take().is_some() {
            debug!("services settings singleton torn down");
        }
    }
}

impl DiagnosticsSettings for ServicesSettings {
    fn diagnostics_trace_level(&self) -> TraceLevel {
        TraceLevel::from_u8(self.trace_level.load(Ordering::Relaxed))
    }

    fn set_diagnostics_trace_level(&self, level: TraceLevel) {
        self.trace_level.store(level as u8, Ordering::Relaxed);
        debug!(%level, "diagnostics trace level changed");
    }
}

/// Forwards to whatever [`ServicesSettings::get_singleton_instance`] returns at the
/// time of each call. Nothing is cached, so a reset is observed immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingletonServicesSettings;

impl DiagnosticsSettings for SingletonServicesSettings {
    fn diagnostics_trace_level(&self) -> TraceLevel {
        let shared = ServicesSettings::get_singleton_instance();
        shared.diagnostics_trace_level()
    }

    fn set_diagnostics_trace_level(&self, level: TraceLevel) {
        let shared = ServicesSettings::get_singleton_instance();
        shared.set_diagnostics_trace_level(level)
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
