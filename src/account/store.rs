use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Account, AccountState, Address};
use crate::config;

const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AccountProfile {
    /// Unique name for this account
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Account address as entered
    pub address: Address,

    /// When this account was added
    pub created_at: String,

    /// Last time this account was made active
    pub last_used: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct AccountStore {
    /// Active account name
    pub active_account: Option<String>,

    /// All saved accounts
    pub accounts: HashMap<String, AccountProfile>,

    /// Store version (for future migrations)
    pub version: u32,

    #[serde(skip)]
    path: PathBuf,
}

impl AccountStore {
    /// Load the store from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Load the store from `path`, starting empty when the file is missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!(path = %path.display(), "no account store yet");
            return Ok(AccountStore {
                version: STORE_VERSION,
                path,
                ..Default::default()
            });
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read account store {}", path.display()))?;

        let mut store: AccountStore = serde_json::from_str(&data)
            .context("Failed to parse account store")?;
        store.path = path;

        Ok(store)
    }

    /// Save the store to the path it was loaded from
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create account store directory")?;
        }

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize account store")?;

        fs::write(&self.path, json)
            .context("Failed to write account store")?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        Ok(config::app_dir()?.join("accounts.json"))
    }

    /// Add a new account profile
    pub fn add_account(&mut self, profile: AccountProfile) -> Result<()> {
        if self.accounts.contains_key(&profile.name) {
            return Err(anyhow!("Account '{}' already exists", profile.name));
        }

        let name = profile.name.clone();
        info!(account = %name, address = %profile.address, "adding account");
        self.accounts.insert(name.clone(), profile);

        // First account becomes active
        if self.active_account.is_none() {
            self.active_account = Some(name);
        }

        self.save()
    }

    /// Switch the active account
    pub fn use_account(&mut self, name: &str) -> Result<()> {
        let profile = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| anyhow!("Account '{}' does not exist", name))?;

        profile.last_used = Some(Utc::now().to_rfc3339());
        self.active_account = Some(name.to_string());
        info!(account = %name, "switched active account");

        self.save()
    }

    /// Remove an account profile
    pub fn remove_account(&mut self, name: &str) -> Result<()> {
        if self.accounts.remove(name).is_none() {
            return Err(anyhow!("Account '{}' does not exist", name));
        }

        // Removing the active account leaves none selected
        if self.active_account.as_deref() == Some(name) {
            self.active_account = None;
        }

        info!(account = %name, "removed account");
        self.save()
    }

    pub fn get_account(&self, name: &str) -> Option<&AccountProfile> {
        self.accounts.get(name)
    }

    pub fn get_active_account(&self) -> Option<&AccountProfile> {
        self.active_account
            .as_deref()
            .and_then(|name| self.accounts.get(name))
    }

    /// List all accounts sorted by last used
    pub fn list_accounts(&self) -> Vec<&AccountProfile> {
        let mut accounts: Vec<&AccountProfile> = self.accounts.values().collect();

        accounts.sort_by(|a, b| match (&b.last_used, &a.last_used) {
            (Some(b_time), Some(a_time)) => b_time.cmp(a_time).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => a.name.cmp(&b.name),
        });

        accounts
    }
}

impl AccountState for AccountStore {
    fn active_account(&self) -> Option<Account> {
        self.get_active_account()
            .map(|p| Account::new(p.name.clone(), p.address.to_string()))
    }
}

impl AccountProfile {
    pub fn new(name: String, address: Address) -> Self {
        Self {
            name,
            description: None,
            address,
            created_at: Utc::now().to_rfc3339(),
            last_used: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Get display name (with description if available)
    pub fn display_name(&self) -> String {
        if let Some(desc) = &self.description {
            format!("{} - {}", self.name, desc)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ADDR1: &str = "Z20d20b8026b8f02540246f58120ddaaf35aecd9b";
    const ADDR2: &str = "0x2090e9f38771876fb6fc51a6b464121d3cc093a1";

    fn store_in(dir: &TempDir) -> AccountStore {
        AccountStore::load_from(dir.path().join("accounts.json")).unwrap()
    }

    fn profile(name: &str, address: &str) -> AccountProfile {
        AccountProfile::new(name.to_string(), address.parse().unwrap())
    }

    #[test]
    fn first_account_becomes_active() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.add_account(profile("main", ADDR1)).unwrap();
        store.add_account(profile("cold", ADDR2)).unwrap();

        assert_eq!(store.active_account.as_deref(), Some("main"));
        let active = store.active_account().unwrap();
        assert_eq!(active.account_address, ADDR1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.add_account(profile("main", ADDR1)).unwrap();
        let err = store.add_account(profile("main", ADDR2)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn use_account_switches_and_stamps() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_account(profile("main", ADDR1)).unwrap();
        store.add_account(profile("cold", ADDR2)).unwrap();

        store.use_account("cold").unwrap();

        assert_eq!(store.active_account.as_deref(), Some("cold"));
        assert!(store.get_account("cold").unwrap().last_used.is_some());
        assert!(store.use_account("missing").is_err());
    }

    #[test]
    fn removing_active_account_clears_it() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_account(profile("main", ADDR1)).unwrap();
        store.add_account(profile("cold", ADDR2)).unwrap();

        store.remove_account("main").unwrap();
        assert!(store.active_account.is_none());
        assert!(store.active_account().is_none());
        assert!(store.get_account("cold").is_some());

        let reloaded = store_in(&dir);
        assert!(reloaded.active_account.is_none());
    }

    #[test]
    fn removing_other_account_keeps_active() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_account(profile("main", ADDR1)).unwrap();
        store.add_account(profile("cold", ADDR2)).unwrap();

        store.remove_account("cold").unwrap();
        assert_eq!(store.active_account.as_deref(), Some("main"));
        assert!(store.remove_account("cold").is_err());
    }

    #[test]
    fn store_persists_between_loads() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store
            .add_account(profile("main", ADDR1).with_description(Some("daily".to_string())))
            .unwrap();

        let reloaded = store_in(&dir);
        let main = reloaded.get_account("main").unwrap();
        assert_eq!(main.address.as_str(), ADDR1);
        assert_eq!(main.display_name(), "main - daily");
        assert_eq!(reloaded.active_account.as_deref(), Some("main"));
        assert_eq!(reloaded.version, STORE_VERSION);
    }

    #[test]
    fn corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(AccountStore::load_from(path).is_err());
    }
}
