//! Settings groups through the envelope path: defaults, updates echoing the
//! new value, persistence across fetches, and reset.

mod common;

use common::spawn_app;
use libretto::client::ClientError;
use serde_json::Value;

#[tokio::test]
async fn defaults_before_any_update() {
    let app = spawn_app().await;

    assert_eq!(app.client.general_settings().await.unwrap().language, "ja");
    assert_eq!(
        app.client.appearance_settings().await.unwrap().theme,
        "system"
    );
    // An unset database directory resolves to the app data directory.
    assert_eq!(
        app.client
            .database_settings()
            .await
            .unwrap()
            .database_directory,
        app.tmp.path().join("data").display().to_string()
    );
}

#[tokio::test]
async fn update_language_echoes_and_next_fetch_returns_it() {
    let app = spawn_app().await;

    let updated = app.client.update_general_settings("en").await.unwrap();
    assert_eq!(updated.language, "en");
    assert_eq!(app.client.general_settings().await.unwrap().language, "en");
}

#[tokio::test]
async fn update_theme_echoes_and_next_fetch_returns_it() {
    let app = spawn_app().await;

    let updated = app.client.update_appearance_settings("dark").await.unwrap();
    assert_eq!(updated.theme, "dark");
    assert_eq!(app.client.appearance_settings().await.unwrap().theme, "dark");
}

#[tokio::test]
async fn update_database_directory_echoes_and_persists() {
    let app = spawn_app().await;
    let dir = app.tmp.path().join("books-db");

    let updated = app
        .client
        .update_database_settings(&dir.display().to_string())
        .await
        .unwrap();
    assert_eq!(updated.database_directory, dir.display().to_string());
    assert_eq!(
        app.client
            .database_settings()
            .await
            .unwrap()
            .database_directory,
        dir.display().to_string()
    );
}

#[tokio::test]
async fn invalid_language_is_rejected() {
    let app = spawn_app().await;

    let err = app
        .client
        .update_general_settings("klingon")
        .await
        .unwrap_err();
    match err {
        ClientError::Graphql(message) => {
            assert!(message.contains("Invalid language"), "{message}")
        }
        other => panic!("expected graphql error, got {other:?}"),
    }
    // The stored value is untouched.
    assert_eq!(app.client.general_settings().await.unwrap().language, "ja");
}

#[tokio::test]
async fn invalid_theme_carries_validation_code() {
    let app = spawn_app().await;

    let mut variables = serde_json::Map::new();
    variables.insert("theme".into(), Value::from("solarized"));
    let response = app
        .client
        .execute(
            &libretto::QueryRequest::new(
                "mutation UpdateAppearanceSettings($theme: String) \
                 { settings { updateAppearanceSettings(theme: $theme) { theme } } }",
            )
            .with_variables(variables),
        )
        .await
        .unwrap();
    assert!(!response.errors.is_empty());
    let code = response.errors[0]
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .and_then(Value::as_str);
    assert_eq!(code, Some("VALIDATION_ERROR"));
}

#[tokio::test]
async fn database_directory_with_missing_parent_is_rejected() {
    let app = spawn_app().await;
    let bad = app.tmp.path().join("missing").join("db");

    let err = app
        .client
        .update_database_settings(&bad.display().to_string())
        .await
        .unwrap_err();
    match err {
        ClientError::Graphql(message) => {
            assert!(message.contains("Parent directory"), "{message}")
        }
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_restores_defaults_across_groups() {
    let app = spawn_app().await;

    app.client.update_general_settings("en").await.unwrap();
    app.client.update_appearance_settings("light").await.unwrap();

    assert!(app.client.reset_settings().await.unwrap());

    assert_eq!(app.client.general_settings().await.unwrap().language, "ja");
    assert_eq!(
        app.client.appearance_settings().await.unwrap().theme,
        "system"
    );
}

#[tokio::test]
async fn updates_are_visible_to_a_fresh_store_instance() {
    let app = spawn_app().await;
    app.client.update_appearance_settings("dark").await.unwrap();

    // A second store over the same config dir sees the persisted file, not
    // just the first store's cache.
    let reopened = libretto::settings::SettingsStore::new(
        app.tmp.path().join("config"),
        app.tmp.path().join("data"),
    );
    assert_eq!(
        reopened.appearance().await.unwrap().theme.as_str(),
        "dark"
    );
}
