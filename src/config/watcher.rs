//! Settings file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_settings, settings_files};
use crate::config::mode::Mode;
use crate::config::settings::Settings;

/// A watcher that reloads settings when their files change.
pub struct SettingsWatcher {
    root: PathBuf,
    mode: Mode,
    initial: Settings,
    update_tx: mpsc::UnboundedSender<Settings>,
}

impl SettingsWatcher {
    /// Create a new SettingsWatcher.
    ///
    /// `initial` is the seed every reload starts from. Returns the watcher
    /// and a receiver for reloaded settings.
    pub fn new(
        root: &Path,
        mode: Mode,
        initial: Settings,
    ) -> (Self, mpsc::UnboundedReceiver<Settings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                root: root.to_path_buf(),
                mode,
                initial,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let root = self.root.clone();
        let mode = self.mode.clone();
        let initial = self.initial.clone();
        let watched = settings_files(&normalize(&self.root), &self.mode);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.paths.iter().any(|p| is_watched(&watched, p));
                    if relevant && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::info!("Settings change detected, reloading...");
                        match load_settings(&root, &mode, initial.clone()) {
                            Ok(settings) => {
                                if tx.send(settings).is_err() {
                                    tracing::debug!("Settings receiver dropped");
                                }
                            }
                            Err(e) => tracing::error!(
                                error = %e,
                                "Failed to reload settings. Keeping current settings."
                            ),
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = ?self.root, mode = %self.mode, "Settings watcher started");
        Ok(watcher)
    }
}

/// Resolves symlinks in the directory part of `path`. The file itself may
/// not exist (yet), so only its parent is canonicalized.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent().and_then(|dir| dir.canonicalize().ok()), path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// True if `path` is one of the settings files, compared by full path.
fn is_watched(watched: &[PathBuf], path: &Path) -> bool {
    let path = normalize(path);
    watched.iter().any(|w| *w == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_only_root_settings_files_are_watched() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("settings")).unwrap();
        fs::create_dir_all(root.join("vendor/settings")).unwrap();
        fs::write(root.join("settings.toml"), "").unwrap();
        fs::write(root.join("vendor/settings.toml"), "").unwrap();
        fs::write(root.join("vendor/settings/test.toml"), "").unwrap();

        let watched = settings_files(&normalize(root), &Mode::Test);

        assert!(is_watched(&watched, &root.join("settings.toml")));
        assert!(is_watched(&watched, &root.join("settings/test.toml")));
        assert!(!is_watched(&watched, &root.join("settings/production.toml")));
        assert!(!is_watched(&watched, &root.join("vendor/settings.toml")));
        assert!(!is_watched(&watched, &root.join("vendor/settings/test.toml")));
    }
}
