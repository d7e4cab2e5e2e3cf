use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&dir.path().join(SETTINGS_FILE), env_from(&[]));
    assert_eq!(settings, ClientSettings::default());
    assert!(settings.single_first_page_default);
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join(SETTINGS_FILE);
    fs::write(
        &file,
        "database_url = \"sqlite://./library.db\"\nsingle_first_page = false\n",
    )
    .expect("write settings");

    let settings = load_settings_from(&file, env_from(&[]));

    assert_eq!(settings.database_url, "sqlite://./library.db");
    assert!(!settings.single_first_page_default);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join(SETTINGS_FILE);
    fs::write(&file, "database_url = \"sqlite://./file.db\"\n").expect("write settings");

    let settings = load_settings_from(
        &file,
        env_from(&[
            ("MANGA_DATABASE_URL", "sqlite://./env.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
            ("APP__SINGLE_FIRST_PAGE", " false "),
        ]),
    );

    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert!(!settings.single_first_page_default);
}

#[test]
fn invalid_values_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join(SETTINGS_FILE);
    fs::write(&file, "single_first_page = \"maybe\"\n").expect("write settings");

    let settings = load_settings_from(&file, env_from(&[("APP__SINGLE_FIRST_PAGE", "sometimes")]));

    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn core_config_passes_url_through_without_touching_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("manga.db");
    let settings = ClientSettings {
        database_url: db_path.to_string_lossy().into_owned(),
        ..ClientSettings::default()
    };

    let config = settings.core_config().expect("core config");

    assert_eq!(config.database_url, settings.database_url);
    assert!(!dir.path().join("nested").exists());
}

#[test]
fn blank_database_url_is_rejected() {
    let settings = ClientSettings {
        database_url: "   ".into(),
        ..ClientSettings::default()
    };

    let err = settings.core_config().expect_err("blank url");
    assert!(err.to_string().contains("database_url"));
}
