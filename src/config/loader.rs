//! Settings loading from disk.
//!
//! # Responsibilities
//! - Read `<root>/settings.toml`
//! - Overlay `<root>/settings/<mode>.toml`
//! - Validate the `[app]` section of the result
//!
//! # Design Decisions
//! - Missing files are skipped; malformed files are fatal
//! - Initial settings passed by the caller sit under both files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use toml::Table;

use crate::config::mode::Mode;
use crate::config::settings::Settings;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for settings loading.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
    Section {
        name: String,
        message: String,
    },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "IO error reading {}: {}", path.display(), source)
            }
            ConfigError::Parse { path: Some(path), source } => {
                write!(f, "Parse error in {}: {}", path.display(), source)
            }
            ConfigError::Parse { path: None, source } => write!(f, "Parse error: {}", source),
            ConfigError::Section { name, message } => {
                write!(f, "Invalid settings section '{}': {}", name, message)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Files consulted for `root` and `mode`, in merge order.
pub fn settings_files(root: &Path, mode: &Mode) -> Vec<PathBuf> {
    vec![
        root.join("settings.toml"),
        root.join("settings").join(format!("{}.toml", mode)),
    ]
}

/// Load, merge and validate settings for `mode` from `root`.
pub fn load_settings(root: &Path, mode: &Mode, initial: Settings) -> Result<Settings, ConfigError> {
    let mut settings = initial;

    for path in settings_files(root, mode) {
        match read_table(&path)? {
            Some(table) => {
                tracing::debug!(path = %path.display(), "Settings file applied");
                settings.apply(table);
            }
            None => tracing::debug!(path = %path.display(), "Settings file not present, skipped"),
        }
    }

    let config = settings.app_config()?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(settings)
}

fn read_table(path: &Path) -> Result<Option<Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    content
        .parse::<Table>()
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_yields_initial() {
        let dir = tempfile::tempdir().unwrap();
        let initial = Settings::parse("test = 'test1'").unwrap();
        let settings = load_settings(dir.path(), &Mode::Test, initial.clone()).unwrap();
        assert_eq!(settings, initial);
    }

    #[test]
    fn test_mode_file_overlays_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "name = 'base'\n[db]\nhost = 'localhost'\nport = 1\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("settings")).unwrap();
        fs::write(dir.path().join("settings/test.toml"), "[db]\nport = 2\n").unwrap();
        fs::write(dir.path().join("settings/production.toml"), "name = 'prod'\n").unwrap();

        let settings = load_settings(dir.path(), &Mode::Test, Settings::default()).unwrap();
        assert_eq!(settings.resolve("name").unwrap().as_str(), Some("base"));
        let db = settings.resolve("db").unwrap();
        assert_eq!(db["host"].as_str(), Some("localhost"));
        assert_eq!(db["port"].as_integer(), Some(2));
    }

    #[test]
    fn test_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.toml"), "this is = = not toml").unwrap();

        let err = load_settings(dir.path(), &Mode::Development, Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: Some(_), .. }));
    }

    #[test]
    fn test_invalid_app_section_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "[app]\nsigil = '/'\n[app.events]\nstarted = ''\n",
        )
        .unwrap();

        let err = load_settings(dir.path(), &Mode::Development, Settings::default()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
