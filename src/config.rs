use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Seconds the node keeps the account unlocked after a successful call.
pub const DEFAULT_UNLOCK_DURATION_SECS: u64 = 300;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Directory holding config, account store and log file
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".account-unlock"))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Node JSON-RPC endpoint
    pub rpc_url: String,

    /// How long the node keeps the account unlocked
    pub unlock_duration_secs: u64,

    /// HTTP timeout for a single unlock request
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            unlock_duration_secs: DEFAULT_UNLOCK_DURATION_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf> {
        Ok(app_dir()?.join("config.json"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Missing file yields defaults; a file that exists must parse.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        serde_json::from_str(&data).context("Failed to parse config")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
