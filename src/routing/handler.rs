//! Event handlers.
//!
//! # Responsibilities
//! - Wrap callbacks invoked on emit
//! - Give handlers an identity so they can be unregistered
//! - Offer a fire-and-forget form for asynchronous work
//!
//! # Design Decisions
//! - Identity is the allocation: clones of one `Handler` are equal,
//!   two handlers built from identical closures are not
//! - Handlers run synchronously inside emit. Asynchronous tails are spawned
//!   and never reported back to the emitter

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::routing::path::Params;

type HandlerFn = dyn Fn(&[Value], &Params) + Send + Sync;

/// A callback registered against a path.
///
/// Receives the emitted arguments and, as the final argument, the
/// parameters bound from the path.
#[derive(Clone)]
pub struct Handler {
    f: Arc<HandlerFn>,
    label: &'static str,
}

impl Handler {
    /// Wraps a synchronous callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value], &Params) + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            label: "sync",
        }
    }

    /// Wraps an asynchronous callback.
    ///
    /// Each invocation spawns the returned future on the current tokio
    /// runtime. Its completion and any failure are only logged; emit
    /// does not wait for it.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let f = Arc::new(f);
        Self {
            f: Arc::new(move |args: &[Value], params: &Params| {
                let handle = match tokio::runtime::Handle::try_current() {
                    Ok(handle) => handle,
                    Err(_) => {
                        tracing::warn!("No async runtime available, dropping handler invocation");
                        return;
                    }
                };
                let fut = f(args.to_vec(), params.clone());
                handle.spawn(async move {
                    if let Err(e) = fut.await {
                        tracing::warn!(error = %e, "Spawned handler failed");
                    }
                });
            }),
            label: "spawned",
        }
    }

    /// Invokes the callback.
    pub fn call(&self, args: &[Value], params: &Params) {
        (self.f)(args, params)
    }

    /// True when both values refer to the same registration.
    pub fn same(&self, other: &Handler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.f), Arc::as_ptr(&other.f))
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.label)
            .field("ptr", &Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}
