//! Authentication module for the rides API
//!
//! Implements the OAuth2 authorization code grant with a manually pasted
//! redirect URL, and persists the resulting credential to a TOML file.

pub mod credential;
pub mod oauth;

pub use credential::OAuth2Credential;
pub use oauth::{login, logout, refresh, session, status};

use crate::config::AppConfig;

/// Provider OAuth2 endpoints
pub struct AuthConfig {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: "https://login.uber.com/oauth/v2/authorize",
            token_url: "https://login.uber.com/oauth/v2/token",
        }
    }
}

/// The app registration used to talk to the token endpoint
#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

impl From<&AppConfig> for ClientRegistration {
    fn from(app: &AppConfig) -> Self {
        Self {
            client_id: app.client_id.clone(),
            client_secret: app.client_secret.clone(),
            redirect_url: app.redirect_url.clone(),
            scopes: app.scopes.clone(),
        }
    }
}

impl From<&OAuth2Credential> for ClientRegistration {
    fn from(cred: &OAuth2Credential) -> Self {
        Self {
            client_id: cred.client_id.clone(),
            client_secret: cred.client_secret.clone(),
            redirect_url: cred.redirect_url.clone(),
            scopes: cred.scopes.clone(),
        }
    }
}
