use clap::{Subcommand, ValueEnum};

use crate::services::config_service;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    ApiUrl,
    AuthUrl,
    AuthKey,
    DefaultWorkspace,
    TimeoutSecs,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Store a setting in the config file
    Set { key: ConfigKey, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), String> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Set { key, value } => set(key, &value),
    }
}

fn show() -> Result<(), String> {
    let settings = config_service::get_settings()?;
    println!("api_url           {}", settings.api_url);
    println!("auth_url          {}", settings.auth_url.as_deref().unwrap_or("-"));
    println!(
        "auth_key          {}",
        if settings.auth_anon_key.is_some() { "(set)" } else { "-" }
    );
    println!(
        "default_workspace {}",
        settings.default_workspace.as_deref().unwrap_or("-")
    );
    match settings.request_timeout {
        Some(timeout) => println!("timeout           {}s", timeout.as_secs()),
        None => println!("timeout           none"),
    }
    Ok(())
}

fn set(key: ConfigKey, value: &str) -> Result<(), String> {
    match key {
        ConfigKey::ApiUrl => config_service::set_api_url(value),
        ConfigKey::AuthUrl => config_service::set_auth_url(value),
        ConfigKey::AuthKey => config_service::set_auth_anon_key(value),
        ConfigKey::DefaultWorkspace => config_service::set_default_workspace(value),
        ConfigKey::TimeoutSecs => {
            let secs = value
                .parse::<u64>()
                .map_err(|e| format!("Invalid timeout '{}': {}", value, e))?;
            config_service::set_request_timeout(secs)
        }
    }
}
