use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::WebConfig;
use crate::core::error::ConfigError;
use crate::features::auth::JwksClient;
use crate::features::oidc::DiscoveryClient;

use super::api_client::ApiClient;
use super::oidc_client::OidcClient;
use super::session::{session_id, Session, SessionStore};

const PROVIDER_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct WebState {
    pub oidc: Arc<OidcClient>,
    pub sessions: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    /// Adds `Secure` to the session cookie; set when the public URL is https.
    pub secure_cookies: bool,
}

impl WebState {
    /// Provider and API clients for a validated configuration.
    pub fn new(config: &WebConfig) -> Result<Self, ConfigError> {
        let discovery = Arc::new(DiscoveryClient::new(
            &config.auth.authority,
            config.auth.require_https_metadata,
            PROVIDER_CACHE_TTL,
        ));
        let jwks = JwksClient::new(discovery.clone(), PROVIDER_CACHE_TTL);

        Ok(Self {
            oidc: Arc::new(OidcClient::new(config, discovery, jwks)),
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            api: Arc::new(ApiClient::new(&config.endpoints)?),
            secure_cookies: config.app.public_url.starts_with("https://"),
        })
    }
}

/// The caller's session, if the cookie points at a live one.
pub struct MaybeSession(pub Option<(String, Session)>);

impl FromRequestParts<WebState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WebState,
    ) -> Result<Self, Self::Rejection> {
        let Some(id) = session_id(&CookieJar::from_headers(&parts.headers)) else {
            return Ok(Self(None));
        };

        Ok(Self(state.sessions.get(&id).await.map(|session| (id, session))))
    }
}
