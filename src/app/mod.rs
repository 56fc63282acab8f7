//! Application orchestrator.
//!
//! # Responsibilities
//! - Own the event router, unit registry, hook table and settings snapshot
//! - Run init at most once, wrapped in its hooks
//! - Wrap start, stop and command dispatch in their hooks
//! - Emit the started / stopped / settings-reloaded lifecycle events
//!
//! # Data Flow
//! ```text
//! start()
//!   will_start
//!     ensure_inited() ── InitGuard, once, spawned ──┐
//!       [defaults] aliases                          │
//!       will_init → init body → did_init            │
//!       UnitRegistry::init_all                      │
//!     ◀─────────────────────────────────────────────┘
//!     emit(events.started)
//!   did_start
//!
//! stop()      will_stop → emit(events.stopped) → did_stop
//! dispatch()  will_dispatch → unit.method(args) → did_dispatch
//! ```
//!
//! # Design Decisions
//! - Every App lives in an `Arc`; the weak self-reference lets settings
//!   bindings and builtin units call back into it without a cycle
//! - The router lock is released before handlers run, so handlers may
//!   register or unregister handlers
//! - The `[app]` section is read once at build time; reloads replace the
//!   settings snapshot only

mod builder;
mod builtin;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{AppConfig, Mode, Settings};
use crate::error::{Error, Result};
use crate::hooks::{sync_hook, HookFn, HookFuture, HookTable, Interceptor, Method};
use crate::lifecycle::{InitGuard, InitState};
use crate::observability::metrics;
use crate::routing::{EventRouter, Handler, RouteId};
use crate::units::{Command, Unit, UnitRegistry};

pub use builder::AppBuilder;

/// An application instance.
pub struct App {
    id: Uuid,
    mode: Mode,
    started_at: Instant,
    settings: ArcSwap<Settings>,
    config: AppConfig,
    units: UnitRegistry,
    router: RwLock<EventRouter>,
    interceptor: Interceptor<App>,
    init_body: RwLock<Option<HookFn<App>>>,
    guard: InitGuard,
    this: Weak<App>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Instance id, generated at build time.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// The `[app]` section this instance was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Hook table consulted by every wrapped call.
    pub fn hooks(&self) -> &HookTable<App> {
        self.interceptor.table()
    }

    pub fn init_state(&self) -> InitState {
        self.guard.state()
    }

    /// A strong handle to this instance, if it is still alive.
    pub fn handle(&self) -> Option<Arc<App>> {
        self.this.upgrade()
    }

    // Units

    pub fn add_unit(&self, name: impl Into<String>, unit: impl Unit) -> &Self {
        self.units.add(name, unit);
        self
    }

    /// Resolves a unit by name or alias.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Unit>> {
        self.units.resolve(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Unit>> {
        self.units.get(name)
    }

    // Events

    pub fn on(&self, path: &str, handler: Handler) -> RouteId {
        self.router_mut().on(path, handler)
    }

    pub fn on_prefixed<I, S>(&self, prefixes: I, suffix: &str, handler: Handler) -> Vec<RouteId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.router_mut().on_prefixed(prefixes, suffix, handler)
    }

    pub fn off(&self, path: &str, handler: &Handler) -> bool {
        self.router_mut().off(path, handler)
    }

    pub fn off_prefixed<I, S>(&self, prefixes: I, suffix: &str, handler: &Handler) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.router_mut().off_prefixed(prefixes, suffix, handler)
    }

    /// Invokes the handlers registered for `path`, returning how many ran.
    ///
    /// Handlers run synchronously and in registration order. Spawned
    /// handler tails are not awaited.
    pub fn emit(&self, path: &str, args: &[Value]) -> usize {
        let delivery = self
            .router
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(path);
        delivery.run(args)
    }

    /// Number of handlers registered for the shape of `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        self.router
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .listener_count(path)
    }

    fn router_mut(&self) -> std::sync::RwLockWriteGuard<'_, EventRouter> {
        self.router.write().unwrap_or_else(PoisonError::into_inner)
    }

    // Lifecycle

    /// Sets the init body, replacing any previous one.
    pub fn set_init<F>(&self, body: F)
    where
        F: for<'a> Fn(&'a App) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.set_init_fn(Arc::new(body));
    }

    pub fn set_init_sync<F>(&self, body: F)
    where
        F: Fn(&App) -> Result<()> + Send + Sync + 'static,
    {
        self.set_init_fn(sync_hook(body));
    }

    fn set_init_fn(&self, body: HookFn<App>) {
        *self.init_body.write().unwrap_or_else(PoisonError::into_inner) = Some(body);
    }

    /// Initializes the application once.
    ///
    /// The first call applies `[defaults]` aliases, runs the init body
    /// between `will_init` and `did_init`, then initializes every unit.
    /// That sequence runs on its own task and completes even if the caller
    /// stops waiting. Every other call, concurrent or later, waits for and
    /// returns the same outcome.
    pub async fn ensure_inited(&self) -> Result<()> {
        let app = self.handle();
        self.guard
            .run(move || async move {
                let app = app.ok_or_else(|| Error::msg("application is shutting down"))?;
                app.initialize().await
            })
            .await
    }

    async fn initialize(&self) -> Result<()> {
        let began = Instant::now();
        tracing::info!(app = %self.id, mode = %self.mode, "Initializing application");

        self.apply_defaults()?;
        self.interceptor
            .intercept(self, Method::Init, || self.run_init_body())
            .await?;
        self.units.init_all(self).await?;

        tracing::info!(
            app = %self.id,
            units = self.units.len(),
            elapsed_ms = began.elapsed().as_millis() as u64,
            "Application initialized"
        );
        Ok(())
    }

    fn apply_defaults(&self) -> Result<()> {
        for (alias, target) in self.settings.load().defaults() {
            self.units.alias(alias, &target)?;
        }
        Ok(())
    }

    async fn run_init_body(&self) -> Result<()> {
        let body = self
            .init_body
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match body {
            Some(body) => body(self).await,
            None => Ok(()),
        }
    }

    /// Initializes if needed, then emits the started event.
    ///
    /// May be called repeatedly; each call emits again.
    pub async fn start(&self) -> Result<()> {
        self.interceptor
            .intercept(self, Method::Start, || async {
                self.ensure_inited().await?;
                tracing::info!(app = %self.id, "Application started");
                self.emit(&self.config.events.started, &[]);
                Ok(())
            })
            .await
    }

    /// Emits the stopped event. Does not depend on init.
    pub async fn stop(&self) -> Result<()> {
        self.interceptor
            .intercept(self, Method::Stop, || async {
                tracing::info!(app = %self.id, uptime_ms = self.uptime().as_millis() as u64, "Application stopped");
                self.emit(&self.config.events.stopped, &[]);
                Ok(())
            })
            .await
    }

    /// Calls `method` on `unit` for a `"<unit>.<method>"` command.
    pub async fn dispatch(&self, command: &str, args: Vec<Value>) -> Result<Value> {
        let command: Command = command.parse()?;
        self.dispatch_command(&command, args).await
    }

    pub(crate) async fn dispatch_command(&self, command: &Command, args: Vec<Value>) -> Result<Value> {
        self.interceptor
            .intercept(self, Method::Dispatch, || self.invoke(command, args))
            .await
    }

    /// Calls the unit method without the dispatch hooks.
    pub(crate) async fn invoke(&self, command: &Command, args: Vec<Value>) -> Result<Value> {
        let unit = self.units.resolve(command.unit())?;
        if !unit.has_method(command.method()) {
            return Err(Error::MethodMissing {
                unit: command.unit().to_string(),
                method: command.method().to_string(),
            });
        }

        tracing::debug!(command = %command, args = args.len(), "Dispatching command");
        metrics::record_dispatch(command.unit());
        unit.call(command.method(), args).await
    }

    /// Replaces the settings snapshot and emits the reload event.
    pub fn reload_settings(&self, settings: Settings) {
        match settings.app_config() {
            Ok(config) if config != self.config => {
                tracing::warn!("[app] section changed; restart to apply it");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Reloaded [app] section is invalid"),
        }

        self.settings.store(Arc::new(settings));
        tracing::info!(app = %self.id, "Settings reloaded");
        self.emit(&self.config.events.settings_reloaded, &[]);
    }

    /// Unit names after initialization, in registration order.
    pub async fn unit_names(&self) -> Result<Vec<String>> {
        self.ensure_inited().await?;
        Ok(self.units.names())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("init_state", &self.init_state())
            .field("units", &self.units)
            .field("hooks", self.interceptor.table())
            .finish_non_exhaustive()
    }
}
