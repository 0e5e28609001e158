use base64::prelude::*;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::core::config::{KeycloakClientOptions, WebConfig};
use crate::core::error::AppError;
use crate::features::auth::model::Claims;
use crate::features::auth::{AuthenticatedUser, JwksClient, JwksError};
use crate::features::oidc::{DiscoveryClient, DiscoveryError, PROVIDER_TIMEOUT};

/// Clock skew tolerated on ID token timestamps.
const ID_TOKEN_LEEWAY_SECS: u64 = 60;

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        // Two simple UUIDs: 64 unreserved characters, within RFC 7636's 43..=128
        let verifier = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self::from_verifier(verifier)
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = BASE64_URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Token endpoint response for the authorization-code grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Result of a completed login.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub user: AuthenticatedUser,
    pub access_token: String,
    pub id_token: String,
}

/// Relying-party side of the authorization-code flow.
pub struct OidcClient {
    options: KeycloakClientOptions,
    redirect_uri: String,
    post_logout_redirect_uri: String,
    discovery: Arc<DiscoveryClient>,
    jwks: JwksClient,
    client: reqwest::Client,
}

impl OidcClient {
    pub fn new(config: &WebConfig, discovery: Arc<DiscoveryClient>, jwks: JwksClient) -> Self {
        Self {
            options: config.auth.clone(),
            redirect_uri: config.redirect_uri(),
            post_logout_redirect_uri: config.post_logout_redirect_uri(),
            discovery,
            jwks,
            client: reqwest::Client::new(),
        }
    }

    /// Authorization endpoint URL for a new login attempt.
    pub async fn authorization_url(
        &self,
        state: &str,
        nonce: &str,
        pkce: &Pkce,
    ) -> Result<String, OidcError> {
        let metadata = self.discovery.metadata().await?;
        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| OidcError::InvalidEndpoint(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("response_type", self.options.response_type())
            .append_pair("client_id", &self.options.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.options.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("nonce", nonce)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(url.into())
    }

    /// Redeem `code`, check the ID token and load userinfo claims.
    pub async fn complete_login(
        &self,
        code: &str,
        code_verifier: &str,
        nonce: &str,
    ) -> Result<SignedInUser, OidcError> {
        let tokens = self.exchange_code(code, code_verifier).await?;

        // The openid scope makes the ID token mandatory
        let id_token = tokens
            .id_token
            .ok_or_else(|| OidcError::InvalidIdToken("missing id_token".to_string()))?;
        let mut claims = self.validate_id_token(&id_token, nonce).await?;

        // Userinfo claims are layered over the ID token's
        for (name, value) in self.fetch_userinfo(&tokens.access_token).await? {
            claims.insert(name, value);
        }

        let user = AuthenticatedUser::from_claims(
            &claims,
            &self.options.name_claim_type,
            &self.options.role_claim_type,
        );

        tracing::info!("User {} signed in", user.name);

        Ok(SignedInUser {
            user,
            access_token: tokens.access_token,
            id_token,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OidcError> {
        let token_endpoint = self.discovery.metadata().await?.token_endpoint;

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.options.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = self.options.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self
            .client
            .post(&token_endpoint)
            .timeout(PROVIDER_TIMEOUT)
            .form(&form)
            .send()
            .await
            .map_err(|e| OidcError::TokenEndpoint(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OidcError::TokenEndpoint(format!(
                "Token request failed: HTTP {} - {}",
                status, body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OidcError::TokenEndpoint(format!("Failed to parse token response: {}", e)))
    }

    async fn validate_id_token(&self, id_token: &str, nonce: &str) -> Result<Claims, OidcError> {
        let header =
            decode_header(id_token).map_err(|e| OidcError::InvalidIdToken(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(OidcError::InvalidIdToken(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| OidcError::InvalidIdToken("Missing kid in token header".to_string()))?;
        let key = self.jwks.get_key(&kid).await?;
        let issuer = self.discovery.metadata().await?.issuer;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.options.client_id]);
        validation.set_issuer(&[issuer]);
        validation.leeway = ID_TOKEN_LEEWAY_SECS;

        let claims = decode::<Claims>(id_token, &key, &validation)
            .map_err(|e| OidcError::InvalidIdToken(e.to_string()))?
            .claims;

        if claims.get("nonce").and_then(Value::as_str) != Some(nonce) {
            return Err(OidcError::NonceMismatch);
        }

        Ok(claims)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<Claims, OidcError> {
        let Some(userinfo_endpoint) = self.discovery.metadata().await?.userinfo_endpoint else {
            return Ok(Claims::new());
        };

        let response = self
            .client
            .get(&userinfo_endpoint)
            .timeout(PROVIDER_TIMEOUT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OidcError::UserInfo(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OidcError::UserInfo(format!(
                "Userinfo request failed: HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Claims>()
            .await
            .map_err(|e| OidcError::UserInfo(e.to_string()))
    }

    /// Where to send the browser on sign-out, if the provider supports it.
    pub async fn end_session_url(
        &self,
        id_token_hint: Option<&str>,
    ) -> Result<Option<String>, OidcError> {
        let Some(endpoint) = self.discovery.metadata().await?.end_session_endpoint else {
            return Ok(None);
        };

        let mut url =
            Url::parse(&endpoint).map_err(|e| OidcError::InvalidEndpoint(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.options.client_id)
                .append_pair("post_logout_redirect_uri", &self.post_logout_redirect_uri);
            if let Some(hint) = id_token_hint {
                query.append_pair("id_token_hint", hint);
            }
        }

        Ok(Some(url.into()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Jwks(#[from] JwksError),

    #[error("Invalid provider endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Token endpoint error: {0}")]
    TokenEndpoint(String),

    #[error("Userinfo endpoint error: {0}")]
    UserInfo(String),

    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    #[error("ID token nonce does not match the login request")]
    NonceMismatch,
}

impl From<OidcError> for AppError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::InvalidIdToken(_) | OidcError::NonceMismatch | OidcError::Jwks(_) => {
                AppError::Auth(err.to_string())
            }
            OidcError::Discovery(_)
            | OidcError::InvalidEndpoint(_)
            | OidcError::TokenEndpoint(_)
            | OidcError::UserInfo(_) => AppError::ExternalServiceError(err.to_string()),
        }
    }
}
