//! Units every application registers for itself.
//!
//! - `app`: `info`, `units`, `emit <path> [args...]`
//! - `settings`: `resolve <name>`, `sections`

use std::sync::{Arc, Weak};

use futures_util::future::{self, BoxFuture};
use serde_json::{json, Value};

use crate::app::App;
use crate::error::{Error, Result};
use crate::units::Unit;

pub(super) const APP_UNIT: &str = "app";
pub(super) const SETTINGS_UNIT: &str = "settings";

fn upgrade(app: &Weak<App>) -> Result<Arc<App>> {
    app.upgrade()
        .ok_or_else(|| Error::msg("application is no longer running"))
}

fn string_arg(args: &[Value], index: usize, what: &str) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::msg(format!("expected {} as argument {}", what, index + 1)))
}

/// The application itself, as a unit.
pub(super) struct AppUnit {
    pub(super) app: Weak<App>,
}

impl AppUnit {
    const METHODS: [&'static str; 3] = ["emit", "info", "units"];

    fn call_sync(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let app = upgrade(&self.app)?;
        match method {
            "info" => Ok(json!({
                "id": app.id(),
                "mode": app.mode().as_str(),
                "uptime_ms": app.uptime().as_millis() as u64,
                "init_state": app.init_state(),
                "units": app.units().names(),
            })),
            "units" => Ok(json!({
                "units": app.units().names(),
                "aliases": app
                    .units()
                    .aliases()
                    .into_iter()
                    .map(|(alias, target)| (alias, Value::String(target)))
                    .collect::<serde_json::Map<_, _>>(),
            })),
            "emit" => {
                let path = string_arg(&args, 0, "an event path")?;
                let count = app.emit(&path, &args[1..]);
                Ok(json!(count))
            }
            other => Err(Error::MethodMissing {
                unit: APP_UNIT.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

impl Unit for AppUnit {
    fn has_method(&self, method: &str) -> bool {
        Self::METHODS.contains(&method)
    }

    fn methods(&self) -> Vec<String> {
        Self::METHODS.iter().map(|m| m.to_string()).collect()
    }

    fn call<'a>(&'a self, method: &'a str, args: Vec<Value>) -> BoxFuture<'a, Result<Value>> {
        Box::pin(future::ready(self.call_sync(method, args)))
    }
}

/// Read access to the settings snapshot, as a unit.
pub(super) struct SettingsUnit {
    pub(super) app: Weak<App>,
}

impl SettingsUnit {
    const METHODS: [&'static str; 2] = ["resolve", "sections"];

    fn call_sync(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let settings = upgrade(&self.app)?.settings();
        match method {
            "resolve" => {
                let name = string_arg(&args, 0, "a section name")?;
                Ok(serde_json::to_value(settings.resolve(&name)?)?)
            }
            "sections" => Ok(json!(settings.table().keys().collect::<Vec<_>>())),
            other => Err(Error::MethodMissing {
                unit: SETTINGS_UNIT.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

impl Unit for SettingsUnit {
    fn has_method(&self, method: &str) -> bool {
        Self::METHODS.contains(&method)
    }

    fn methods(&self) -> Vec<String> {
        Self::METHODS.iter().map(|m| m.to_string()).collect()
    }

    fn call<'a>(&'a self, method: &'a str, args: Vec<Value>) -> BoxFuture<'a, Result<Value>> {
        Box::pin(future::ready(self.call_sync(method, args)))
    }
}
