//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that hook names follow the naming convention
//! - Check that hook commands address a unit and a method
//! - Check that lifecycle event paths are concrete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system
//! - Binding commands are checked when the handler is built, so a bad one
//!   surfaces as an invalid handler

use std::fmt;

use crate::config::schema::AppConfig;
use crate::hooks::HookPoint;
use crate::routing::path::{segments, Segment};
use crate::units::Command;

/// A single semantic problem in the `[app]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the `[app]` section.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sigil == '/' || config.sigil.is_whitespace() {
        errors.push(ValidationError::new(
            "app.sigil",
            format!("'{}' cannot mark parameters", config.sigil),
        ));
    }

    let events = [
        ("app.events.started", &config.events.started),
        ("app.events.stopped", &config.events.stopped),
        ("app.events.settings_reloaded", &config.events.settings_reloaded),
    ];
    for (field, path) in events {
        if segments(path, config.sigil).next().is_none() {
            errors.push(ValidationError::new(field, "path must not be empty"));
        } else if segments(path, config.sigil).any(|s| matches!(s, Segment::Param(_))) {
            errors.push(ValidationError::new(
                field,
                format!("'{}' must not contain parameter segments", path),
            ));
        }
    }

    for (name, command) in &config.hooks.commands {
        let field = format!("app.hooks.commands.{}", name);
        if let Err(e) = name.parse::<HookPoint>() {
            errors.push(ValidationError::new(field.clone(), e.to_string()));
        }
        if let Err(e) = command.parse::<Command>() {
            errors.push(ValidationError::new(field, e.to_string()));
        }
    }

    for (i, binding) in config.bindings.iter().enumerate() {
        let field = format!("app.bindings[{}]", i);
        if segments(&binding.path, config.sigil).next().is_none() {
            errors.push(ValidationError::new(field, "path must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BindingConfig;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.events.stopped = "app/:who".into();
        config
            .hooks
            .commands
            .insert("before_start".into(), "audit.record".into());
        config
            .hooks
            .commands
            .insert("did_start".into(), "nodot".into());
        config.bindings.push(BindingConfig {
            path: "/".into(),
            command: "mailer.send".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "app.events.stopped",
                "app.hooks.commands.before_start",
                "app.hooks.commands.did_start",
                "app.bindings[0]",
            ]
        );
    }
}
