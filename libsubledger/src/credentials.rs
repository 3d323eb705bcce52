//! Credential file handling
//!
//! Credentials are a plain JSON object with the app's `client_id` and
//! `client_secret`, the values registered with the platform's app
//! console.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Load credentials from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy().to_string()).to_string();
        let content = std::fs::read_to_string(expanded).map_err(ConfigError::ReadError)?;
        let creds: Credentials =
            serde_json::from_str(&content).map_err(ConfigError::ParseError)?;

        if creds.client_id.is_empty() {
            return Err(ConfigError::MissingField("client_id".to_string()).into());
        }
        if creds.client_secret.is_empty() {
            return Err(ConfigError::MissingField("client_secret".to_string()).into());
        }

        Ok(creds)
    }
}
