//! Units: independently registered application modules.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use serde_json::Value;

use crate::app::App;
use crate::error::{Error, Result};

/// What a unit sees when it is initialized.
#[derive(Clone, Copy)]
pub struct UnitContext<'a> {
    pub app: &'a App,
    /// Name the unit was registered under.
    pub name: &'a str,
}

impl fmt::Debug for UnitContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContext")
            .field("app", &self.app.id())
            .field("name", &self.name)
            .finish()
    }
}

/// An application module managed by the [`UnitRegistry`](crate::units::UnitRegistry).
pub trait Unit: Send + Sync + 'static {
    /// Called once by `init_all`. Does nothing by default.
    fn init<'a>(&'a self, _ctx: UnitContext<'a>) -> BoxFuture<'a, Result<()>> {
        Box::pin(future::ready(Ok(())))
    }

    /// True if `method` can be dispatched to this unit.
    fn has_method(&self, _method: &str) -> bool {
        false
    }

    /// Names of the dispatchable methods.
    fn methods(&self) -> Vec<String> {
        Vec::new()
    }

    /// Invokes `method` with `args`.
    fn call<'a>(&'a self, method: &'a str, _args: Vec<Value>) -> BoxFuture<'a, Result<Value>> {
        Box::pin(future::ready(Err(Error::MethodMissing {
            unit: std::any::type_name_of_val(self).to_string(),
            method: method.to_string(),
        })))
    }

    /// Plain data carried by the unit, if it is a value unit.
    fn value(&self) -> Option<&Value> {
        None
    }
}

/// A unit that is just a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueUnit(pub Value);

impl Unit for ValueUnit {
    fn value(&self) -> Option<&Value> {
        Some(&self.0)
    }
}

type MethodFn = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;
type InitFn = Arc<dyn for<'a> Fn(UnitContext<'a>) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// A unit assembled from closures.
///
/// ```ignore
/// let mailer = MethodUnit::new()
///     .method_sync("send", |args| Ok(json!({ "queued": args.len() })));
/// ```
#[derive(Default)]
pub struct MethodUnit {
    name: Option<String>,
    methods: BTreeMap<String, MethodFn>,
    on_init: Option<InitFn>,
}

impl MethodUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported in errors. Defaults to the type name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an asynchronous method.
    #[must_use]
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.methods
            .insert(name.into(), Arc::new(move |args| Box::pin(f(args))));
        self
    }

    /// Adds a synchronous method.
    #[must_use]
    pub fn method_sync<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods
            .insert(name.into(), Arc::new(move |args| Box::pin(future::ready(f(args)))));
        self
    }

    /// Sets the body run by `init`.
    #[must_use]
    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(UnitContext<'a>) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.on_init = Some(Arc::new(f));
        self
    }
}

impl Unit for MethodUnit {
    fn init<'a>(&'a self, ctx: UnitContext<'a>) -> BoxFuture<'a, Result<()>> {
        match &self.on_init {
            Some(f) => f(ctx),
            None => Box::pin(future::ready(Ok(()))),
        }
    }

    fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    fn call<'a>(&'a self, method: &'a str, args: Vec<Value>) -> BoxFuture<'a, Result<Value>> {
        match self.methods.get(method) {
            Some(f) => f(args),
            None => Box::pin(future::ready(Err(Error::MethodMissing {
                unit: self
                    .name
                    .clone()
                    .unwrap_or_else(|| std::any::type_name_of_val(self).to_string()),
                method: method.to_string(),
            }))),
        }
    }
}

impl fmt::Debug for MethodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodUnit")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("on_init", &self.on_init.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn method_unit_calls_and_lists() {
        let unit = MethodUnit::new()
            .method_sync("echo", |args| Ok(Value::Array(args)))
            .method("double", |args| async move {
                let n = args.first().and_then(Value::as_i64).unwrap_or_default();
                Ok(json!(n * 2))
            });

        assert!(unit.has_method("echo"));
        assert!(!unit.has_method("missing"));
        assert_eq!(unit.methods(), vec!["double".to_string(), "echo".to_string()]);

        assert_eq!(unit.call("echo", vec![json!(1)]).await.unwrap(), json!([1]));
        assert_eq!(unit.call("double", vec![json!(21)]).await.unwrap(), json!(42));
        assert!(matches!(
            unit.call("missing", vec![]).await,
            Err(Error::MethodMissing { .. })
        ));
    }

    #[tokio::test]
    async fn method_unit_missing_method_names_unit() {
        let named = MethodUnit::new().named("mailer");
        match named.call("send", vec![]).await {
            Err(Error::MethodMissing { unit, method }) => {
                assert_eq!(unit, "mailer");
                assert_eq!(method, "send");
            }
            other => panic!("expected MethodMissing, got {other:?}"),
        }

        let anonymous = MethodUnit::new();
        let err = anonymous.call("send", vec![]).await.unwrap_err();
        assert!(err.to_string().contains("MethodUnit"), "{err}");
    }

    #[test]
    fn value_unit_exposes_value() {
        let unit = ValueUnit(json!("test value"));
        assert_eq!(unit.value(), Some(&json!("test value")));
        assert!(unit.methods().is_empty());
    }
}
