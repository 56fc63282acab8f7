//! Settings loading and reload tests.

use std::fs;

use app_runtime::config::ConfigError;
use app_runtime::{Error, Mode, Settings};
use serde_json::json;

mod common;

use common::{test_app, Recorder};

fn write_site(dir: &std::path::Path) {
    fs::write(
        dir.join("settings.toml"),
        r#"
        [mailer]
        from = "ops@example.com"
        retries = 1

        [defaults]
        mail = "mailer"
        "#,
    )
    .unwrap();
    fs::create_dir(dir.join("settings")).unwrap();
    fs::write(dir.join("settings/test.toml"), "[mailer]\nretries = 3\n").unwrap();
    fs::write(dir.join("settings/production.toml"), "[mailer]\nretries = 9\n").unwrap();
}

#[tokio::test]
async fn test_root_files_overlay_initial_settings() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());

    let app = test_app()
        .settings(Settings::parse("seed = 'kept'").unwrap())
        .root(dir.path())
        .build()
        .unwrap();

    let settings = app.settings();
    assert_eq!(settings.resolve("seed").unwrap().as_str(), Some("kept"));
    let mailer = settings.resolve("mailer").unwrap();
    assert_eq!(mailer["from"].as_str(), Some("ops@example.com"));
    assert_eq!(mailer["retries"].as_integer(), Some(3));
}

#[tokio::test]
async fn test_mode_selects_overlay() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());

    let app = test_app()
        .mode(Mode::Production)
        .root(dir.path())
        .build()
        .unwrap();

    let value = app
        .dispatch("settings.resolve", vec![json!("mailer")])
        .await
        .unwrap();
    assert_eq!(value["retries"], json!(9));
}

#[tokio::test]
async fn test_defaults_from_files_alias_units() {
    let dir = tempfile::tempdir().unwrap();
    write_site(dir.path());

    let app = test_app()
        .root(dir.path())
        .unit("mailer", app_runtime::ValueUnit(json!("smtp")))
        .build()
        .unwrap();

    let names = app.unit_names().await.unwrap();
    assert_eq!(names, vec!["app", "settings", "mailer"]);
    assert_eq!(app.resolve("mail").unwrap().value(), Some(&json!("smtp")));
}

#[tokio::test]
async fn test_invalid_app_section_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("settings.toml"), "[app]\nsigil = '/'\n").unwrap();

    let err = test_app().root(dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
}

#[tokio::test]
async fn test_malformed_app_section_fails_build() {
    let settings = Settings::parse("[app]\nsigil = 42\n").unwrap();
    let err = test_app().settings(settings).build().unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Section { .. })));
}

#[tokio::test]
async fn test_reload_swaps_snapshot_and_emits() {
    let log = Recorder::new();
    let app = test_app()
        .settings(Settings::parse("[mailer]\nretries = 1").unwrap())
        .build()
        .unwrap();
    app.on("app/settings/reloaded", log.handler("reloaded"));

    let before = app.settings();
    let mut next = (*before).clone();
    next.apply("[mailer]\nretries = 5".parse().unwrap());
    app.reload_settings(next);

    assert_eq!(before.resolve("mailer").unwrap()["retries"].as_integer(), Some(1));
    assert_eq!(
        app.settings().resolve("mailer").unwrap()["retries"].as_integer(),
        Some(5)
    );
    assert_eq!(log.entries(), vec!["reloaded"]);
}

#[tokio::test]
async fn test_missing_section_names_key() {
    let app = test_app().build().unwrap();
    let err = app.settings().resolve("error").unwrap_err();
    assert_eq!(err.to_string(), "settings 'error' not found");
}
