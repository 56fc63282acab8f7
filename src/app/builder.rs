//! Builder for [`App`].

use std::path::PathBuf;
use std::sync::{Arc, RwLock, Weak};
use std::time::Instant;

use arc_swap::ArcSwap;
use uuid::Uuid;

use super::builtin::{AppUnit, SettingsUnit, APP_UNIT, SETTINGS_UNIT};
use super::App;
use crate::config::validation::validate_config;
use crate::config::{load_settings, ConfigError, Mode, Settings};
use crate::error::{Error, Result};
use crate::hooks::{sync_hook, HookFn, HookFuture, HookPoint, Interceptor};
use crate::lifecycle::InitGuard;
use crate::routing::{EventRouter, Handler};
use crate::units::{Command, Unit, UnitRegistry};

/// Builder for [`App`].
///
/// Hooks and the init body registered here take the place of methods a
/// subclass would define.
///
/// # Example
///
/// ```ignore
/// let app = App::builder()
///     .mode(Mode::Test)
///     .settings(Settings::parse("[mailer]\nfrom = 'ops@example.com'")?)
///     .init_sync(|app| {
///         app.add_unit("mailer", Mailer::default());
///         Ok(())
///     })
///     .hook_sync(HookPoint::did(Method::Start), |_| Ok(()))
///     .build()?;
///
/// app.start().await?;
/// ```
pub struct AppBuilder {
    settings: Settings,
    mode: Mode,
    root: Option<PathBuf>,
    init: Option<HookFn<App>>,
    hooks: Vec<(HookPoint, HookFn<App>)>,
    units: Vec<(String, Arc<dyn Unit>)>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            mode: Mode::default(),
            root: None,
            init: None,
            hooks: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Sets the initial settings. Files loaded from [`root`](Self::root)
    /// are merged over them.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Loads `settings.toml` and `settings/<mode>.toml` from `root` at build time.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the init body.
    #[must_use]
    pub fn init<F>(mut self, body: F) -> Self
    where
        F: for<'a> Fn(&'a App) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(body));
        self
    }

    #[must_use]
    pub fn init_sync<F>(mut self, body: F) -> Self
    where
        F: Fn(&App) -> Result<()> + Send + Sync + 'static,
    {
        self.init = Some(sync_hook(body));
        self
    }

    /// Registers a hook. Overrides a hook bound to the same point in settings.
    #[must_use]
    pub fn hook<F>(mut self, point: HookPoint, hook: F) -> Self
    where
        F: for<'a> Fn(&'a App) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.hooks.push((point, Arc::new(hook)));
        self
    }

    #[must_use]
    pub fn hook_sync<F>(mut self, point: HookPoint, hook: F) -> Self
    where
        F: Fn(&App) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.push((point, sync_hook(hook)));
        self
    }

    #[must_use]
    pub fn unit(mut self, name: impl Into<String>, unit: impl Unit) -> Self {
        self.units.push((name.into(), Arc::new(unit)));
        self
    }

    /// Builds the application.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if settings cannot be loaded or the `[app]`
    /// section is invalid, and [`Error::InvalidHandler`] if a settings
    /// binding does not name a dispatchable command.
    pub fn build(self) -> Result<Arc<App>> {
        let settings = match &self.root {
            Some(root) => load_settings(root, &self.mode, self.settings)?,
            None => self.settings,
        };
        let config = settings.app_config()?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let hook_commands = config
            .hooks
            .commands
            .iter()
            .map(|(name, command)| {
                let point = name
                    .parse::<HookPoint>()
                    .map_err(|e| Error::msg(e.to_string()))?;
                Ok((point, command.parse::<Command>()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let bindings = config
            .bindings
            .iter()
            .map(|binding| {
                let command = binding
                    .command
                    .parse::<Command>()
                    .map_err(|_| Error::InvalidHandler(format!("{:?}", binding.command)))?;
                Ok((binding.path.clone(), command))
            })
            .collect::<Result<Vec<_>>>()?;

        let mode = self.mode;
        let init = self.init;
        let hooks = self.hooks;
        let units = self.units;

        let app = Arc::new_cyclic(|this: &Weak<App>| {
            let mut router = EventRouter::with_sigil(config.sigil);
            for (path, command) in bindings {
                router.on(&path, binding_handler(this.clone(), command));
            }

            let interceptor = Interceptor::new(config.hooks.error_mode);
            for (point, command) in hook_commands {
                interceptor.table().set(point, move |app: &App| {
                    let command = command.clone();
                    Box::pin(async move { app.invoke(&command, Vec::new()).await.map(drop) })
                });
            }
            for (point, hook) in hooks {
                interceptor.table().insert(point, hook);
            }

            let registry = UnitRegistry::new();
            registry.add(APP_UNIT, AppUnit { app: this.clone() });
            registry.add(SETTINGS_UNIT, SettingsUnit { app: this.clone() });
            registry.add_all(units);

            App {
                id: Uuid::new_v4(),
                mode,
                started_at: Instant::now(),
                settings: ArcSwap::from_pointee(settings),
                config,
                units: registry,
                router: RwLock::new(router),
                interceptor,
                init_body: RwLock::new(init),
                guard: InitGuard::new(),
                this: this.clone(),
            }
        });

        tracing::info!(
            app = %app.id,
            mode = %app.mode,
            units = app.units.len(),
            hooks = ?app.hooks().points(),
            "Application built"
        );
        Ok(app)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler that dispatches `command` with the event's arguments followed by
/// its parameters. Runs detached from the emitter.
fn binding_handler(app: Weak<App>, command: Command) -> Handler {
    Handler::spawn(move |mut args, params| {
        let app = app.clone();
        let command = command.clone();
        async move {
            let Some(app) = app.upgrade() else {
                return Ok(());
            };
            args.push(params.to_json());
            app.dispatch_command(&command, args).await.map(drop)
        }
    })
}
