use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use super::file_service::{get_app_data_dir, read_json, write_json};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const API_URL_ENV: &str = "RESEARCHPILOT_API_URL";
pub const AUTH_URL_ENV: &str = "RESEARCHPILOT_AUTH_URL";
pub const AUTH_KEY_ENV: &str = "RESEARCHPILOT_AUTH_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub auth_anon_key: Option<String>,
    #[serde(default)]
    pub default_workspace: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Configuration after environment overrides and defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,
    pub default_workspace: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(config: Config) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(config: Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: env(API_URL_ENV)
                .or(config.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            auth_url: env(AUTH_URL_ENV).or(config.auth_url),
            auth_anon_key: env(AUTH_KEY_ENV).or(config.auth_anon_key),
            default_workspace: config.default_workspace,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn get_config_path() -> Result<PathBuf, String> {
    Ok(get_app_data_dir()?.join("config.json"))
}

pub fn load_config_from(path: &Path) -> Result<Config, String> {
    Ok(read_json(path, "config")?.unwrap_or_default())
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), String> {
    write_json(path, config, "config")
}

pub fn load_config() -> Result<Config, String> {
    load_config_from(&get_config_path()?)
}

pub fn save_config(config: &Config) -> Result<(), String> {
    save_config_to(&get_config_path()?, config)
}

fn validate_url(value: &str) -> Result<String, String> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| format!("Invalid URL '{}': {}", value, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme '{}'", parsed.scheme()));
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

pub fn set_api_url(url: &str) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.api_url = Some(validate_url(url)?);
    save_config(&config)
}

pub fn set_auth_url(url: &str) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.auth_url = Some(validate_url(url)?);
    save_config(&config)
}

pub fn set_auth_anon_key(key: &str) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.auth_anon_key = Some(key.to_string());
    save_config(&config)
}

pub fn set_default_workspace(workspace_id: &str) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.default_workspace = Some(workspace_id.to_string());
    save_config(&config)
}

pub fn set_request_timeout(secs: u64) -> Result<(), String> {
    let mut config = load_config().unwrap_or_default();
    config.request_timeout_secs = Some(secs).filter(|s| *s > 0);
    save_config(&config)
}

pub fn get_settings() -> Result<Settings, String> {
    Ok(Settings::resolve(load_config()?))
}
