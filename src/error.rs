//! Runtime error types.
//!
//! # Design Decisions
//! - One error enum for the whole crate; every failure reaches the immediate
//!   caller, nothing here retries
//! - Lookup failures name the missing key
//! - An unmatched route is not an error and has no variant

use std::sync::Arc;

use crate::hooks::HookPoint;

/// Result alias used across the runtime.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the runtime and by user-supplied bodies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A settings section was resolved but does not exist.
    #[error("settings '{0}' not found")]
    SettingsNotFound(String),

    /// A unit was resolved but is not registered.
    #[error("unit '{0}' not found")]
    UnitNotFound(String),

    /// A handler could not be built from the given value.
    #[error("handler should be a callable but got {0}")]
    InvalidHandler(String),

    /// A dispatch command has no method part.
    #[error("invalid command '{0}': expected '<unit>.<method>'")]
    InvalidCommand(String),

    /// The resolved unit has no method with that name.
    #[error("unit '{unit}' has no method '{method}'")]
    MethodMissing { unit: String, method: String },

    /// A pre-hook failed (tagged hook error mode).
    #[error("{point} hook failed: {source}")]
    Hook {
        point: HookPoint,
        #[source]
        source: Box<Error>,
    },

    /// A post-hook failed after the wrapped method succeeded (tagged hook error mode).
    #[error("{point} hook failed after success: {source}")]
    PostHook {
        point: HookPoint,
        #[source]
        source: Box<Error>,
    },

    /// Initialization already ran and failed; later callers observe the same failure.
    #[error("initialization failed: {0}")]
    Init(Arc<Error>),

    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Free-form failure raised by a hook, init body or unit method.
    #[error("{0}")]
    Failed(String),
}

impl Error {
    /// Builds a free-form failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Failed(message.into())
    }

    /// Strips hook tagging and init replay wrappers, returning the innermost error.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Hook { source, .. } | Error::PostHook { source, .. } => source.root_cause(),
            Error::Init(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Method, Stage};

    #[test]
    fn lookup_messages_name_the_key() {
        assert_eq!(
            Error::SettingsNotFound("error".into()).to_string(),
            "settings 'error' not found"
        );
        assert_eq!(
            Error::UnitNotFound("mailer".into()).to_string(),
            "unit 'mailer' not found"
        );
        assert_eq!(
            Error::MethodMissing {
                unit: "mailer".into(),
                method: "send".into()
            }
            .to_string(),
            "unit 'mailer' has no method 'send'"
        );
    }

    #[test]
    fn root_cause_unwraps_tags() {
        let err = Error::PostHook {
            point: HookPoint::new(Stage::Did, Method::Start),
            source: Box::new(Error::msg("boom")),
        };
        assert_eq!(err.to_string(), "did_start hook failed after success: boom");
        assert_eq!(err.root_cause().to_string(), "boom");

        let replay = Error::Init(Arc::new(Error::msg("db down")));
        assert_eq!(replay.root_cause().to_string(), "db down");
    }
}
