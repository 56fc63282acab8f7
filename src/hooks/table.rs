//! Registered hook table.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::{self, BoxFuture};

use crate::error::Result;
use crate::hooks::point::HookPoint;

/// Future returned by a hook body.
pub type HookFuture<'a> = BoxFuture<'a, Result<()>>;

/// A hook body. Receives the host it runs on; takes no other arguments.
pub type HookFn<H> = Arc<dyn for<'a> Fn(&'a H) -> HookFuture<'a> + Send + Sync>;

/// Wraps a synchronous body so it can be stored as a [`HookFn`].
pub fn sync_hook<H, F>(f: F) -> HookFn<H>
where
    H: 'static,
    F: Fn(&H) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(bind(move |host| Box::pin(future::ready(f(host)))))
}

/// Pins the higher-ranked signature onto a closure.
fn bind<H, F>(f: F) -> F
where
    F: for<'a> Fn(&'a H) -> HookFuture<'a>,
{
    f
}

/// Hooks keyed by point, read on every intercepted call.
///
/// Hooks may be added or replaced at any time; the next intercepted
/// call sees the change.
pub struct HookTable<H> {
    hooks: RwLock<HashMap<HookPoint, HookFn<H>>>,
}

impl<H: 'static> HookTable<H> {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Installs an asynchronous hook, returning the one it replaced.
    pub fn set<F>(&self, point: HookPoint, hook: F) -> Option<HookFn<H>>
    where
        F: for<'a> Fn(&'a H) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.insert(point, Arc::new(hook))
    }

    /// Installs a synchronous hook, returning the one it replaced.
    pub fn set_sync<F>(&self, point: HookPoint, hook: F) -> Option<HookFn<H>>
    where
        F: Fn(&H) -> Result<()> + Send + Sync + 'static,
    {
        self.insert(point, sync_hook(hook))
    }

    pub fn insert(&self, point: HookPoint, hook: HookFn<H>) -> Option<HookFn<H>> {
        let previous = self
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point, hook);
        if previous.is_some() {
            tracing::debug!(hook = %point, "Hook replaced");
        }
        previous
    }

    pub fn remove(&self, point: HookPoint) -> Option<HookFn<H>> {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&point)
    }

    /// Looks up the hook for `point`.
    pub fn get(&self, point: HookPoint) -> Option<HookFn<H>> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&point)
            .cloned()
    }

    pub fn contains(&self, point: HookPoint) -> bool {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&point)
    }

    /// Installed points in `will`/`did` order per method.
    pub fn points(&self) -> Vec<HookPoint> {
        HookPoint::all().filter(|p| self.contains(*p)).collect()
    }
}

impl<H: 'static> Default for HookTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: 'static> fmt::Debug for HookTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTable")
            .field("points", &self.points())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::point::Method;

    struct Host;

    #[tokio::test]
    async fn set_get_replace_remove() {
        let table: HookTable<Host> = HookTable::new();
        let point = HookPoint::will(Method::Start);
        assert!(table.get(point).is_none());

        assert!(table.set_sync(point, |_| Ok(())).is_none());
        assert!(table
            .set(point, |_| Box::pin(async { Err(crate::Error::msg("second")) }))
            .is_some());

        let hook = table.get(point).unwrap();
        let err = hook(&Host).await.unwrap_err();
        assert_eq!(err.to_string(), "second");

        assert_eq!(table.points(), vec![point]);
        assert!(table.remove(point).is_some());
        assert!(!table.contains(point));
    }
}
