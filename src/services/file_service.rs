use std::fs;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const DATA_DIR_ENV: &str = "RESEARCHPILOT_DATA_DIR";

pub fn get_app_data_dir() -> Result<PathBuf, String> {
    let data_dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or("Could not find data directory")?
            .join("ResearchPilot"),
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| e.to_string())?;
    }

    Ok(data_dir)
}

/// Read a JSON document, or `None` when the file does not exist yet.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>, String> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", what, e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| format!("Failed to parse {}: {}", what, e))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize {}: {}", what, e))?;
    fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {}", what, e))?;
    Ok(())
}

pub fn remove_file(path: &Path, what: &str) -> Result<(), String> {
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| format!("Failed to remove {}: {}", what, e))?;
    }
    Ok(())
}
