//! Application configuration and file locations

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::places::Place;

const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "oauth2_session_store.toml";

/// App credentials registered with the ride-hailing developer dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Talk to the sandbox API instead of production
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
    /// Extra or overriding named places
    #[serde(default)]
    pub places: BTreeMap<String, Place>,
}

fn default_scopes() -> Vec<String> {
    vec!["profile".to_string(), "request".to_string()]
}

fn default_sandbox() -> bool {
    true
}

impl AppConfig {
    /// Load app credentials from an explicit path or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        let content = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read app config at {}. Set client_id, client_secret and redirect_url there.",
                path.display()
            )
        })?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse app config at {}", path.display()))
    }

    /// Load if present; a missing file is not an error
    pub fn load_optional(path: Option<&Path>) -> Result<Option<Self>> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load(Some(path.as_path())).map(Some)
    }

    fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// File locations for one run
#[derive(Debug, Clone)]
pub struct Paths {
    /// Explicit app config path; `None` means the default location
    pub config: Option<PathBuf>,
    pub store: PathBuf,
}

impl Paths {
    pub fn resolve(config: Option<PathBuf>, store: Option<PathBuf>) -> Result<Self> {
        let store = match store {
            Some(p) => p,
            None => store_path()?,
        };
        Ok(Self { config, store })
    }

    pub fn app_config(&self) -> Result<AppConfig> {
        AppConfig::load(self.config.as_deref())
    }

    pub fn app_config_optional(&self) -> Result<Option<AppConfig>> {
        AppConfig::load_optional(self.config.as_deref())
    }
}

/// Get config directory path
pub fn config_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "ride-estimate", "ride-estimate")
        .context("Could not determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default app config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Default credential store path
pub fn store_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(STORE_FILE))
}
