//! Authenticated HTTP client for the rides API
//!
//! Wraps reqwest::Client with bearer token injection.

use anyhow::{bail, Context, Result};

use crate::models::{EstimateRequest, ProductsResponse, RideEstimate};

const PRODUCTION_BASE: &str = "https://api.uber.com";
const SANDBOX_BASE: &str = "https://sandbox-api.uber.com";
const API_VERSION: &str = "v1.2";

/// Client bound to one access token and one API environment
pub struct RidesClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl RidesClient {
    pub fn new(access_token: impl Into<String>, sandbox: bool) -> Self {
        let base = if sandbox {
            SANDBOX_BASE
        } else {
            PRODUCTION_BASE
        };
        Self::with_base_url(access_token, base)
    }

    pub fn with_base_url(access_token: impl Into<String>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.base_url, API_VERSION, path)
    }

    /// Products available at a location
    pub async fn get_products(&self, latitude: f64, longitude: f64) -> Result<ProductsResponse> {
        let url = self.url("/products");
        tracing::debug!("GET {} ({}, {})", url, latitude, longitude);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept-Language", "en_US")
            .query(&[("latitude", latitude), ("longitude", longitude)])
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let body: serde_json::Value = check_response(resp, &url)
            .await?
            .json()
            .await
            .context("Failed to read products response")?;
        ProductsResponse::from_value(body).context("Failed to parse products response")
    }

    /// Upfront fare estimate for a trip
    pub async fn estimate_ride(&self, request: &EstimateRequest) -> Result<RideEstimate> {
        let url = self.url("/requests/estimate");
        tracing::debug!("POST {} product={}", url, request.product_id);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Accept-Language", "en_US")
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let body: serde_json::Value = check_response(resp, &url)
            .await?
            .json()
            .await
            .context("Failed to read estimate response")?;
        RideEstimate::from_value(body).context("Failed to parse estimate response")
    }
}

/// Check HTTP response status code and return a clear error on failure.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        bail!(
            "401 Unauthorized for {}. Token may be invalid -- run 'ride-estimate login --force'.",
            url
        );
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("HTTP {} for {}: {}", status.as_u16(), url, body);
    }
    Ok(resp)
}
