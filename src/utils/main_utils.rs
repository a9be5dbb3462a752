use crate::utils::error::{PredictiveError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn read_toml_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| PredictiveError::ConfigError {
        message: format!("cannot read {}: {}", path.as_ref().display(), e),
    })?;
    Ok(toml::from_str(&content)?)
}

pub fn read_json_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Writes pretty JSON, creating parent directories first.
pub fn write_json_file<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data)?;
    Ok(())
}
