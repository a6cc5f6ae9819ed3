//! OAuth2 authorization code grant with a pasted redirect URL

use anyhow::{Context, Result};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use super::credential::{now_secs, CredentialStore, FileStore, OAuth2Credential};
use super::{AuthConfig, ClientRegistration};
use crate::config::Paths;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_TTL_SECS: u64 = 3600;

/// Failures of the authorization step itself. These are reported to the
/// user and end the attempt; everything else propagates.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Redirect URL could not be parsed: {0}")]
    InvalidRedirect(String),

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("State parameter does not match the authorization request")]
    StateMismatch,

    #[error("Redirect URL has no authorization code")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

/// Whether a run can reuse what is on disk
#[derive(Debug, PartialEq)]
pub enum SessionPlan {
    Cached(OAuth2Credential),
    Interactive,
}

impl SessionPlan {
    pub fn from_stored(stored: Option<OAuth2Credential>, now: u64) -> Self {
        match stored {
            Some(cred) if cred.is_valid_at(now) => SessionPlan::Cached(cred),
            _ => SessionPlan::Interactive,
        }
    }
}

/// One authorization attempt: the authorization URL and the CSRF state it
/// carries, plus the client used to redeem the code.
pub struct AuthorizationCodeGrant {
    client: BasicClient,
    registration: ClientRegistration,
    auth_url: Url,
    state: CsrfToken,
}

impl AuthorizationCodeGrant {
    pub fn new(registration: ClientRegistration, endpoints: &AuthConfig) -> Result<Self> {
        let client = build_client(&registration, endpoints)?;
        let (auth_url, state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(registration.scopes.iter().cloned().map(Scope::new))
            .url();

        Ok(Self {
            client,
            registration,
            auth_url,
            state,
        })
    }

    pub fn authorization_url(&self) -> &Url {
        &self.auth_url
    }

    pub fn state(&self) -> &str {
        self.state.secret()
    }

    /// Pull the authorization code out of the URL the provider redirected to.
    pub fn parse_redirect(&self, redirect: &str) -> Result<String, AuthError> {
        let url =
            Url::parse(redirect.trim()).map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Err(AuthError::Denied(error));
        }
        if state.as_deref() != Some(self.state()) {
            return Err(AuthError::StateMismatch);
        }
        code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)
    }

    /// Validate the redirect and redeem its code for a credential.
    pub async fn exchange(&self, redirect: &str) -> Result<OAuth2Credential, AuthError> {
        let code = self.parse_redirect(redirect)?;
        tracing::debug!("Exchanging authorization code");

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(credential_from_token(
            &self.registration,
            &token,
            "authorization_code",
            None,
            now_secs(),
        ))
    }
}

/// Build the OAuth2 client from an app registration
fn build_client(
    registration: &ClientRegistration,
    endpoints: &AuthConfig,
) -> Result<BasicClient> {
    let auth_url = AuthUrl::new(endpoints.authorize_url.to_string())?;
    let token_url = TokenUrl::new(endpoints.token_url.to_string())?;
    let redirect_url = RedirectUrl::new(registration.redirect_url.clone())
        .context("Invalid redirect_url in app config")?;

    Ok(BasicClient::new(
        ClientId::new(registration.client_id.clone()),
        Some(ClientSecret::new(registration.client_secret.clone())),
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::RequestBody)
    .set_redirect_uri(redirect_url))
}

fn credential_from_token(
    registration: &ClientRegistration,
    token: &BasicTokenResponse,
    grant_type: &str,
    previous_refresh: Option<String>,
    now: u64,
) -> OAuth2Credential {
    let scopes = token
        .scopes()
        .map(|s| s.iter().map(|scope| scope.to_string()).collect())
        .unwrap_or_else(|| registration.scopes.clone());

    OAuth2Credential {
        client_id: registration.client_id.clone(),
        client_secret: registration.client_secret.clone(),
        redirect_url: registration.redirect_url.clone(),
        access_token: token.access_token().secret().to_string(),
        refresh_token: token
            .refresh_token()
            .map(|rt| rt.secret().to_string())
            .or(previous_refresh),
        expires_at: now.saturating_add(
            token
                .expires_in()
                .map(|d| d.as_secs())
                .unwrap_or(DEFAULT_TTL_SECS),
        ),
        scopes,
        grant_type: grant_type.to_string(),
    }
}

/// Run the console flow: print the authorization URL, read the pasted
/// redirect URL, redeem it, and persist the result. Authorization failures
/// are printed and yield `Ok(None)`.
pub async fn authorize_interactive(
    registration: ClientRegistration,
    store: &dyn CredentialStore,
) -> Result<Option<OAuth2Credential>> {
    let grant = AuthorizationCodeGrant::new(registration, &AuthConfig::default())?;

    println!();
    println!("Login and grant access by going to:");
    println!("{}", grant.authorization_url());
    println!();
    print!("Copy the URL you are redirected to and paste here: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read redirect URL")?;

    let credential = match grant.exchange(line.trim()).await {
        Ok(cred) => cred,
        Err(e) => {
            tracing::warn!("Authorization failed: {}", e);
            eprintln!("{}", e);
            return Ok(None);
        }
    };

    store.save(&credential)?;
    tracing::info!("Credential stored");
    Ok(Some(credential))
}

/// Credential for an API run: the stored one if still valid, otherwise the
/// result of the interactive flow.
pub async fn session(paths: &Paths) -> Result<Option<OAuth2Credential>> {
    let store = FileStore::new(&paths.store);

    match SessionPlan::from_stored(store.load()?, now_secs()) {
        SessionPlan::Cached(cred) => {
            tracing::debug!("Reusing stored credential");
            Ok(Some(cred))
        }
        SessionPlan::Interactive => {
            tracing::info!("No valid stored credential, starting authorization...");
            let app = paths.app_config()?;
            authorize_interactive(ClientRegistration::from(&app), &store).await
        }
    }
}

/// Exchange the stored refresh token and overwrite the store.
/// Returns Ok(false) if there is nothing to refresh.
pub async fn refresh(paths: &Paths) -> Result<bool> {
    let store = FileStore::new(&paths.store);
    let stored = match store.load()? {
        Some(cred) => cred,
        None => return Ok(false),
    };
    let refresh_token = match stored.refresh_token.clone() {
        Some(rt) => rt,
        None => return Ok(false),
    };

    let registration = ClientRegistration::from(&stored);
    let client = build_client(&registration, &AuthConfig::default())?;

    tracing::info!("Refreshing access token...");
    let token = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .context("Failed to refresh access token")?;

    let credential = credential_from_token(
        &registration,
        &token,
        "refresh_token",
        Some(refresh_token),
        now_secs(),
    );
    store.save(&credential)?;
    tracing::info!("Token refresh complete");
    Ok(true)
}

/// Perform the authorization flow and store the credential
pub async fn login(paths: &Paths, force: bool) -> Result<()> {
    let store = FileStore::new(&paths.store);

    if !force {
        if let SessionPlan::Cached(_) = SessionPlan::from_stored(store.load()?, now_secs()) {
            println!("Already logged in (token valid). Use --force to re-authenticate.");
            return Ok(());
        }
    }

    let app = paths.app_config()?;
    match authorize_interactive(ClientRegistration::from(&app), &store).await? {
        Some(_) => println!("Login successful."),
        None => println!("Login failed."),
    }
    Ok(())
}

/// Remove the stored credential
pub async fn logout(paths: &Paths) -> Result<()> {
    FileStore::new(&paths.store).clear()?;
    println!("Logged out.");
    Ok(())
}

/// Display current auth status
pub async fn status(paths: &Paths) -> Result<()> {
    let store = FileStore::new(&paths.store);
    println!("Store:       {}", store.path().display());

    match store.load()? {
        Some(cred) => {
            if cred.is_valid() {
                println!("Access tok:  valid");
            } else {
                println!("Access tok:  expired");
            }
            let expires_at = i64::try_from(cred.expires_at)
                .ok()
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));
            match expires_at {
                Some(at) => println!("  expires_at: {}", at.with_timezone(&chrono::Local)),
                None => println!("  expires_at: {}", cred.expires_at),
            }
            match cred.refresh_token {
                Some(_) => println!("Refresh tok: present"),
                None => println!("Refresh tok: none"),
            }
            println!("Scopes:      {}", cred.scopes.join(" "));
            println!("Grant type:  {}", cred.grant_type);
        }
        None => {
            println!("Access tok:  none");
            println!("\nRun 'ride-estimate login' to authenticate.");
        }
    }

    Ok(())
}
