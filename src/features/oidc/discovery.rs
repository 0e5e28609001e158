use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

use super::PROVIDER_TIMEOUT;

/// Subset of the OpenID provider metadata document used by both services.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

struct MetadataCache {
    metadata: ProviderMetadata,
    last_fetched: Instant,
}

/// Fetches and caches `{authority}/.well-known/openid-configuration`.
pub struct DiscoveryClient {
    authority: String,
    require_https_metadata: bool,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<MetadataCache>>>,
    cache_ttl: Duration,
}

impl DiscoveryClient {
    pub fn new(authority: &str, require_https_metadata: bool, cache_ttl: Duration) -> Self {
        Self {
            authority: authority.trim_end_matches('/').to_string(),
            require_https_metadata,
            client: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
        }
    }

    pub fn metadata_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.authority)
    }

    pub async fn metadata(&self) -> Result<ProviderMetadata, DiscoveryError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.last_fetched.elapsed() < self.cache_ttl {
                    return Ok(cached.metadata.clone());
                }
            }
        }

        self.refresh().await
    }

    /// Fetch the document again; the cached copy is replaced only on success.
    pub async fn refresh(&self) -> Result<ProviderMetadata, DiscoveryError> {
        let metadata_url = self.metadata_url();
        self.ensure_secure(&metadata_url)?;

        tracing::debug!("Fetching OpenID provider metadata from {}", metadata_url);

        let response = self
            .client
            .get(&metadata_url)
            .timeout(PROVIDER_TIMEOUT)
            .send()
            .await
            .map_err(|e| DiscoveryError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::FetchError(format!(
                "Failed to fetch provider metadata: HTTP {}",
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        self.ensure_secure(&metadata.jwks_uri)?;

        let mut cache = self.cache.write().await;
        *cache = Some(MetadataCache {
            metadata: metadata.clone(),
            last_fetched: Instant::now(),
        });

        Ok(metadata)
    }

    fn ensure_secure(&self, address: &str) -> Result<(), DiscoveryError> {
        if !self.require_https_metadata {
            return Ok(());
        }

        match Url::parse(address) {
            Ok(url) if url.scheme() == "https" => Ok(()),
            _ => Err(DiscoveryError::InsecureMetadata(address.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("The metadata address or authority must use HTTPS unless disabled for development: {0}")]
    InsecureMetadata(String),

    #[error("Failed to fetch provider metadata: {0}")]
    FetchError(String),

    #[error("Failed to parse provider metadata: {0}")]
    ParseError(String),
}
