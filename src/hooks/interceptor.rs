//! Will/did sequencing around a wrapped method.
//!
//! # Contract
//! ```text
//! will_<m>  → fails? abort, <m> and did_<m> never run
//! <m>       → fails? abort, did_<m> never runs
//! did_<m>   → fails? propagate even though <m> succeeded
//! result    = <m>'s value, returned only after did_<m> settles
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hooks::point::{HookPoint, Method, Stage};
use crate::hooks::table::HookTable;
use crate::observability::metrics;

/// How hook failures reach the caller of the wrapped method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookErrorMode {
    /// Hook errors propagate unchanged; a failing `did` hook looks like a
    /// failure of the method itself.
    #[default]
    Passthrough,
    /// `will` failures become [`Error::Hook`], `did` failures [`Error::PostHook`].
    Tagged,
}

/// Runs wrapped method bodies between their hooks.
#[derive(Debug)]
pub struct Interceptor<H: 'static> {
    table: HookTable<H>,
    mode: HookErrorMode,
}

impl<H: Sync + 'static> Interceptor<H> {
    pub fn new(mode: HookErrorMode) -> Self {
        Self {
            table: HookTable::new(),
            mode,
        }
    }

    pub fn table(&self) -> &HookTable<H> {
        &self.table
    }

    pub fn mode(&self) -> HookErrorMode {
        self.mode
    }

    /// Runs `body` for `method` on `host`, surrounded by its hooks.
    ///
    /// Hooks are looked up when the call happens, so a hook installed
    /// after construction takes part in the next call.
    pub async fn intercept<T, F, Fut>(&self, host: &H, method: Method, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_hook(host, HookPoint::will(method)).await?;
        let value = body().await?;
        self.run_hook(host, HookPoint::did(method)).await?;
        Ok(value)
    }

    async fn run_hook(&self, host: &H, point: HookPoint) -> Result<()> {
        let Some(hook) = self.table.get(point) else {
            return Ok(());
        };

        tracing::debug!(hook = %point, "Running hook");
        hook(host).await.map_err(|err| {
            tracing::debug!(hook = %point, error = %err, "Hook failed");
            metrics::record_hook_failure(point);
            self.tag(point, err)
        })
    }

    fn tag(&self, point: HookPoint, err: Error) -> Error {
        match (self.mode, point.stage) {
            (HookErrorMode::Passthrough, _) => err,
            (HookErrorMode::Tagged, Stage::Will) => Error::Hook {
                point,
                source: Box::new(err),
            },
            (HookErrorMode::Tagged, Stage::Did) => Error::PostHook {
                point,
                source: Box::new(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Host {
        log: Mutex<Vec<&'static str>>,
    }

    impl Host {
        fn push(&self, entry: &'static str) {
            self.log.lock().unwrap().push(entry);
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    fn interceptor(mode: HookErrorMode) -> Interceptor<Host> {
        let i = Interceptor::new(mode);
        i.table().set(HookPoint::will(Method::Dispatch), |host: &Host| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                host.push("will");
                Ok(())
            })
        });
        i.table()
            .set_sync(HookPoint::did(Method::Dispatch), |host: &Host| {
                host.push("did");
                Ok(())
            });
        i
    }

    #[tokio::test]
    async fn test_will_body_did_order() {
        let host = Host::default();
        let i = interceptor(HookErrorMode::Passthrough);

        let out = i
            .intercept(&host, Method::Dispatch, || async {
                tokio::task::yield_now().await;
                host.push("body");
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(out, 7);
        assert_eq!(host.log(), vec!["will", "body", "did"]);
    }

    #[tokio::test]
    async fn test_no_hooks_runs_body_only() {
        let host = Host::default();
        let i: Interceptor<Host> = Interceptor::new(HookErrorMode::Passthrough);
        let out = i
            .intercept(&host, Method::Start, || async { Ok("ok") })
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert!(host.log().is_empty());
    }

    #[tokio::test]
    async fn test_will_failure_skips_body_and_did() {
        let host = Host::default();
        let i = interceptor(HookErrorMode::Passthrough);
        i.table()
            .set_sync(HookPoint::will(Method::Dispatch), |_| Err(Error::msg("boom")));

        let err = i
            .intercept(&host, Method::Dispatch, || async {
                host.push("body");
                Ok(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert!(host.log().is_empty());
    }

    #[tokio::test]
    async fn test_body_failure_skips_did() {
        let host = Host::default();
        let i = interceptor(HookErrorMode::Tagged);

        let err = i
            .intercept(&host, Method::Dispatch, || async {
                Err::<(), _>(Error::msg("body broke"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Failed(_)));
        assert_eq!(host.log(), vec!["will"]);
    }

    #[tokio::test]
    async fn test_did_failure_after_success() {
        let host = Host::default();

        let passthrough = interceptor(HookErrorMode::Passthrough);
        passthrough
            .table()
            .set_sync(HookPoint::did(Method::Dispatch), |_| Err(Error::msg("late")));
        let err = passthrough
            .intercept(&host, Method::Dispatch, || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Failed(ref m) if m == "late"));

        let tagged = interceptor(HookErrorMode::Tagged);
        tagged
            .table()
            .set_sync(HookPoint::did(Method::Dispatch), |_| Err(Error::msg("late")));
        let err = tagged
            .intercept(&host, Method::Dispatch, || async { Ok(()) })
            .await
            .unwrap_err();
        match err {
            Error::PostHook { point, source } => {
                assert_eq!(point, HookPoint::did(Method::Dispatch));
                assert_eq!(source.to_string(), "late");
            }
            other => panic!("expected PostHook, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hooks_resolved_per_call() {
        let host = Host::default();
        let i: Interceptor<Host> = Interceptor::new(HookErrorMode::Passthrough);

        i.intercept(&host, Method::Stop, || async { Ok(()) })
            .await
            .unwrap();
        i.table().set_sync(HookPoint::will(Method::Stop), |h: &Host| {
            h.push("late hook");
            Ok(())
        });
        i.intercept(&host, Method::Stop, || async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(host.log(), vec!["late hook"]);
    }
}
