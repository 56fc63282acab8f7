//! Named settings sections.
//!
//! # Responsibilities
//! - Hold the merged settings table
//! - Resolve sections by name, failing loudly on missing ones
//! - Merge overlays (environment files, reloads) into the table
//!
//! # Design Decisions
//! - Sections are untyped TOML values; typed views are deserialized on demand
//! - Overlays merge tables recursively, any other value is replaced

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::schema::AppConfig;
use crate::config::ConfigError;
use crate::error::{Error, Result};

/// Section holding the runtime's own configuration.
pub const APP_SECTION: &str = "app";

/// Section holding `alias = "target"` unit aliases.
pub const DEFAULTS_SECTION: &str = "defaults";

/// Settings provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    table: Table,
}

impl Settings {
    /// Creates settings seeded with `table`.
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    /// Parses settings from TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let table = text.parse::<Table>().map_err(|e| ConfigError::Parse {
            path: None,
            source: e,
        })?;
        Ok(Self::new(table))
    }

    /// Returns the section named `name`.
    pub fn resolve(&self, name: &str) -> Result<&Value> {
        self.table
            .get(name)
            .ok_or_else(|| Error::SettingsNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.table.get(name)
    }

    /// Deserializes the section named `name`.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.resolve(name)?.clone();
        value.try_into().map_err(|e: toml::de::Error| {
            Error::from(ConfigError::Section {
                name: name.to_string(),
                message: e.message().to_string(),
            })
        })
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.table.insert(name.into(), value.into());
    }

    /// Merges `overlay` into these settings, overlay values winning.
    pub fn apply(&mut self, overlay: Table) {
        merge(&mut self.table, overlay);
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Typed view of the `[app]` section, defaults when absent.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        match self.table.get(APP_SECTION) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Section {
                    name: APP_SECTION.to_string(),
                    message: e.message().to_string(),
                }),
            None => Ok(AppConfig::default()),
        }
    }

    /// `alias → target` pairs from the `[defaults]` section.
    pub fn defaults(&self) -> Vec<(String, String)> {
        let Some(Value::Table(defaults)) = self.table.get(DEFAULTS_SECTION) else {
            return Vec::new();
        };
        defaults
            .iter()
            .filter_map(|(name, target)| match target {
                Value::String(target) => Some((name.clone(), target.clone())),
                other => {
                    tracing::warn!(alias = %name, value = %other, "Ignoring non-string default alias");
                    None
                }
            })
            .collect()
    }
}

fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
