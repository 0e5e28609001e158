use axum::http::StatusCode;
use url::Url;

use crate::core::config::ApiEndpointsOptions;
use crate::core::error::{AppError, ConfigError};
use crate::features::oidc::PROVIDER_TIMEOUT;

/// Status and raw body of a call to the protected API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCallResult {
    pub status: StatusCode,
    pub body: String,
}

/// Named outbound client for the resource server.
pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(endpoints: &ApiEndpointsOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: endpoints.api_base_uri()?,
            client: reqwest::Client::new(),
        })
    }

    /// `GET {base}/me` with the user's access token. Non-success statuses are
    /// returned to the caller, not turned into errors.
    pub async fn get_me(&self, access_token: &str) -> Result<ApiCallResult, AppError> {
        let url = format!("{}/me", self.base_url.as_str().trim_end_matches('/'));

        tracing::debug!(
            client = ApiEndpointsOptions::HTTP_CLIENT_NAME,
            "Calling {}",
            url
        );

        let response = self
            .client
            .get(&url)
            .timeout(PROVIDER_TIMEOUT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("API request failed: {}", e)))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.text().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to read API response: {}", e))
        })?;

        Ok(ApiCallResult { status, body })
    }
}
