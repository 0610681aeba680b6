use std::{collections::HashMap, fs};

use client_core::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "upteach.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            database_url: "sqlite://./data/upteach.db".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file_contents = fs::read_to_string(CONFIG_FILE).ok();
    settings_from_sources(file_contents.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then environment variables.
pub fn settings_from_sources(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("base_url") {
                settings.base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
        }
    }

    if let Some(v) = env("UPTEACH_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("UPTEACH_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    settings
}

/// Turns a bare file path into a `sqlite://` URL. The storage crate creates
/// the file and its directory when it opens the database.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let trimmed = raw_database_url.trim();
    if trimmed.is_empty() {
        return Settings::default().database_url;
    }
    if trimmed.contains("://") || trimmed.starts_with("sqlite::") {
        return trimmed.to_string();
    }

    let path = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    format!("sqlite://{}", path.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
