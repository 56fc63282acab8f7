//! Application runtime binary.
//!
//! Boundary layer: picks the mode (flag, then `APP_ENV`, then
//! development), loads settings, installs logging and drives an [`App`].
//!
//! ```text
//! app-runtime --root ./site run --watch
//! app-runtime --root ./site units
//! app-runtime --root ./site call settings.resolve mailer
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notify::RecommendedWatcher;
use serde_json::Value;

use app_runtime::config::{load_settings, SettingsWatcher};
use app_runtime::lifecycle::signals::wait_for_shutdown;
use app_runtime::observability::logging;
use app_runtime::{App, Error, Mode, Result, Settings};

/// Environment variable consulted when `--mode` is absent.
const MODE_ENV: &str = "APP_ENV";

#[derive(Parser)]
#[command(name = "app-runtime")]
#[command(about = "Run and inspect an application runtime", long_about = None)]
struct Cli {
    /// Directory holding settings.toml and settings/<mode>.toml
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Runtime mode (development, test, production or any custom name)
    #[arg(short, long, global = true)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the app and run until SIGINT/SIGTERM
    Run {
        /// Reload settings when their files change
        #[arg(long)]
        watch: bool,
    },
    /// Initialize the app and list its units and aliases
    Units,
    /// Initialize the app and dispatch `<unit>.<method>`
    Call {
        command: String,
        /// Arguments as JSON; anything that is not JSON is passed as a string
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mode = resolve_mode(cli.mode.as_deref());

    let settings = match load_settings(&cli.root, &mode, Settings::default()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let observability = settings
        .app_config()
        .map(|config| config.observability)
        .unwrap_or_default();
    if let Err(e) = logging::init(&observability) {
        eprintln!("warning: logging not initialized: {}", e);
    }

    tracing::info!(mode = %mode, root = %cli.root.display(), "app-runtime v{} starting", env!("CARGO_PKG_VERSION"));

    match execute(cli, mode, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn resolve_mode(flag: Option<&str>) -> Mode {
    let name = flag
        .map(str::to_string)
        .or_else(|| std::env::var(MODE_ENV).ok())
        .unwrap_or_default();
    if name.is_empty() {
        return Mode::default();
    }
    match name.parse() {
        Ok(mode) => mode,
        Err(never) => match never {},
    }
}

async fn execute(cli: Cli, mode: Mode, settings: Settings) -> Result<()> {
    let app = App::builder()
        .mode(mode.clone())
        .settings(settings)
        .build()?;

    match cli.command {
        Commands::Run { watch } => {
            app.start().await?;
            let _watcher = if watch {
                Some(watch_settings(&app, &cli.root, mode)?)
            } else {
                None
            };

            wait_for_shutdown().await;
            app.stop().await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Units => {
            for name in app.unit_names().await? {
                println!("{}", name);
            }
            for (alias, target) in app.units().aliases() {
                println!("{} -> {}", alias, target);
            }
        }
        Commands::Call { command, args } => {
            app.ensure_inited().await?;
            let args = args.iter().map(|arg| parse_arg(arg)).collect();
            let value = app.dispatch(&command, args).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Forwards reloaded settings to `app` until it is dropped.
fn watch_settings(app: &Arc<App>, root: &Path, mode: Mode) -> Result<RecommendedWatcher> {
    let (watcher, mut updates) = SettingsWatcher::new(root, mode, Settings::default());
    let watcher = watcher
        .run()
        .map_err(|e| Error::msg(format!("failed to watch settings: {}", e)))?;

    let app = Arc::downgrade(app);
    tokio::spawn(async move {
        while let Some(settings) = updates.recv().await {
            let Some(app) = app.upgrade() else {
                break;
            };
            app.reload_settings(settings);
        }
    });

    Ok(watcher)
}
