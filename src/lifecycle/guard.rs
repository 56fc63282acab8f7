//! At-most-once initialization.
//!
//! # Design Decisions
//! - The body runs on its own spawned task; callers only wait on it, so a
//!   caller that stops waiting never cancels initialization
//! - Every caller, concurrent or later, awaits one `Shared` completion and
//!   reads the same outcome
//! - A failure is stored too; the body never runs a second time

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use crate::error::{Error, Result};

/// Progress of initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitState {
    NotStarted,
    Initializing,
    Completed,
}

impl InitState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => InitState::Initializing,
            2 => InitState::Completed,
            _ => InitState::NotStarted,
        }
    }
}

type Outcome = std::result::Result<(), Arc<Error>>;

/// Runs an initialization body at most once.
#[derive(Default)]
pub struct InitGuard {
    task: OnceLock<Shared<BoxFuture<'static, Outcome>>>,
    state: Arc<AtomicU8>,
}

impl InitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InitState {
        InitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Runs `body` unless it already ran, then returns its outcome.
    ///
    /// The body is spawned on the current tokio runtime and runs to
    /// completion even if every caller stops waiting. Callers arriving
    /// while it runs wait for it. A failed body is reported to every
    /// caller as [`Error::Init`].
    pub async fn run<F, Fut>(&self, body: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let task = self
            .task
            .get_or_init(|| {
                self.state
                    .store(InitState::Initializing as u8, Ordering::Release);
                let state = Arc::clone(&self.state);
                let work = body();
                let handle = tokio::spawn(async move {
                    let outcome = work.await.map_err(Arc::new);
                    state.store(InitState::Completed as u8, Ordering::Release);
                    outcome
                });

                let state = Arc::clone(&self.state);
                async move {
                    handle.await.unwrap_or_else(|err| {
                        tracing::error!(error = %err, "Initialization task did not finish");
                        state.store(InitState::Completed as u8, Ordering::Release);
                        Err(Arc::new(Error::msg(format!("initialization task: {err}"))))
                    })
                }
                .boxed()
                .shared()
            })
            .clone();

        task.await.map_err(Error::Init)
    }
}

impl std::fmt::Debug for InitGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitGuard")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
