//! Credential storage and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Everything needed to call the API on behalf of a user, plus what is
/// needed to refresh it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Credential {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absolute expiry, Unix seconds
    pub expires_at: u64,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub grant_type: String,
}

impl OAuth2Credential {
    pub fn is_valid_at(&self, now: u64) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_secs())
    }
}

/// Current Unix time in seconds
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Credential store trait for different storage backends
pub trait CredentialStore {
    fn load(&self) -> Result<Option<OAuth2Credential>>;
    fn save(&self, credential: &OAuth2Credential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// TOML file on disk
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<OAuth2Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).context("Failed to read credential file")?;
        let credential = toml::from_str(&content)
            .with_context(|| format!("Failed to parse credential file {}", self.path.display()))?;
        Ok(Some(credential))
    }

    fn save(&self, credential: &OAuth2Credential) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).context("Failed to create credential directory")?;
            }
        }

        let content =
            toml::to_string_pretty(credential).context("Failed to serialize credential")?;
        fs::write(&self.path, content).context("Failed to write credential file")?;

        // Set restrictive permissions (contains tokens and client secret)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .context("Failed to set credential file permissions")?;
        }

        tracing::debug!("Credential written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove credential file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_credential(expires_at: u64) -> OAuth2Credential {
    OAuth2Credential {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_url: "http://localhost:8000/callback".to_string(),
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at,
        scopes: vec!["profile".to_string(), "request".to_string()],
        grant_type: "authorization_code".to_string(),
    }
}
