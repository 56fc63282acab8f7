//! Settings subsystem.
//!
//! # Data Flow
//! ```text
//! initial settings (builder / caller)
//!     → loader.rs   (settings.toml, then settings/<mode>.toml)
//!     → settings.rs (merged named sections)
//!     → validation.rs (semantic checks on [app])
//!     → Settings (held by the App behind an atomic pointer)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs reloads from the same seed
//!     → validation.rs validates
//!     → App swaps the snapshot and emits the reload event
//! ```
//!
//! # Design Decisions
//! - Settings are immutable snapshots; changes replace the whole snapshot
//! - All `[app]` fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod mode;
pub mod schema;
pub mod settings;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, ConfigError};
pub use mode::Mode;
pub use schema::{AppConfig, BindingConfig, EventsConfig, HooksConfig, ObservabilityConfig};
pub use settings::Settings;
pub use validation::ValidationError;
pub use watcher::SettingsWatcher;
