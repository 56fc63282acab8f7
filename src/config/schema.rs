//! Configuration schema for the `[app]` settings section.
//!
//! All types derive Serde traits and default every field, so an absent or
//! partial section is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hooks::HookErrorMode;
use crate::routing::DEFAULT_SIGIL;

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Marks parameter segments in event paths.
    pub sigil: char,

    /// Lifecycle event paths.
    pub events: EventsConfig,

    /// Hook behaviour and declarative hook bindings.
    pub hooks: HooksConfig,

    /// Event subscriptions that dispatch a command.
    pub bindings: Vec<BindingConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sigil: DEFAULT_SIGIL,
            events: EventsConfig::default(),
            hooks: HooksConfig::default(),
            bindings: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Paths the orchestrator emits on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Emitted after `start` has initialized the app.
    pub started: String,

    /// Emitted by `stop`.
    pub stopped: String,

    /// Emitted after settings are reloaded.
    pub settings_reloaded: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            started: "app/started".to_string(),
            stopped: "app/stopped".to_string(),
            settings_reloaded: "app/settings/reloaded".to_string(),
        }
    }
}

/// Hook configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HooksConfig {
    /// Whether hook failures are tagged.
    pub error_mode: HookErrorMode,

    /// Hook name (`will_start`, `did_init`, ...) to dispatch command.
    pub commands: BTreeMap<String, String>,
}

/// An event subscription declared in settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BindingConfig {
    /// Event path, may contain parameter segments.
    pub path: String,

    /// Command dispatched with the event's arguments and parameters.
    pub command: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
