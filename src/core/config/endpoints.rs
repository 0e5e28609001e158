use url::Url;

use crate::core::error::ConfigError;
use crate::shared::validation::is_absolute_uri;

/// Outbound HTTP endpoints consumed by the web client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiEndpointsOptions {
    pub api_base_url: String,
}

impl ApiEndpointsOptions {
    pub const HTTP_CLIENT_NAME: &'static str = "KeycloakApi";

    pub fn from_vars<F>(var: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_base_url: var("ENDPOINTS__API_BASE_URL").unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_absolute_uri(&self.api_base_url) {
            return Err(ConfigError::InvalidApiBaseUrl);
        }

        Ok(())
    }

    /// Parsed form of `api_base_url`. Callers are expected to have run
    /// [`validate`](Self::validate) first; an invalid value still comes back
    /// as the same `ConfigError` instead of a panic.
    pub fn api_base_uri(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base_url).map_err(|_| ConfigError::InvalidApiBaseUrl)
    }
}
