use std::{fs, path::Path};

use anyhow::ensure;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "manga.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub database_url: String,
    pub single_first_page_default: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/manga.db".into(),
            single_first_page_default: true,
        }
    }
}

/// What the core is constructed with. The core owns the meaning of the url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_url: String,
}

impl ClientSettings {
    pub fn core_config(&self) -> anyhow::Result<CoreConfig> {
        ensure!(
            !self.database_url.trim().is_empty(),
            "database_url must not be empty"
        );
        Ok(CoreConfig {
            database_url: self.database_url.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    single_first_page: Option<bool>,
}

/// Defaults, then `manga.toml` in the working directory, then the environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.database_url {
                    settings.database_url = v;
                }
                if let Some(v) = file_cfg.single_first_page {
                    settings.single_first_page_default = v;
                }
            }
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "config: ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("MANGA_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__SINGLE_FIRST_PAGE") {
        if let Ok(parsed) = v.trim().parse::<bool>() {
            settings.single_first_page_default = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
