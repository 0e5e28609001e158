use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;
use super::model::{AuthenticatedUser, Claims};
use crate::core::config::KeycloakAuthenticationOptions;
use crate::core::error::AppError;
use crate::features::oidc::DiscoveryClient;

/// Validates bearer tokens issued by the configured authority.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    discovery: Arc<DiscoveryClient>,
    audience: String,
    validate_issuer: bool,
    name_claim_type: String,
    role_claim_type: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        discovery: Arc<DiscoveryClient>,
        options: &KeycloakAuthenticationOptions,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            discovery,
            audience: options.audience.clone(),
            validate_issuer: options.validate_issuer,
            name_claim_type: options.name_claim_type.clone(),
            role_claim_type: options.role_claim_type.clone(),
            leeway: leeway.as_secs(),
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        if self.validate_issuer {
            let issuer = self
                .discovery
                .metadata()
                .await
                .map_err(|e| AppError::Auth(e.to_string()))?
                .issuer;
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(AuthenticatedUser::from_claims(
            &token_data.claims,
            &self.name_claim_type,
            &self.role_claim_type,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{mock_identity_provider, sign_token, MockIdentityProvider};
    use serde_json::json;

    fn validator(provider: &MockIdentityProvider, validate_issuer: bool) -> JwtValidator {
        let discovery = Arc::new(DiscoveryClient::new(
            &provider.authority,
            false,
            Duration::from_secs(60),
        ));
        let jwks_client = Arc::new(JwksClient::new(discovery.clone(), Duration::from_secs(60)));
        let options = KeycloakAuthenticationOptions {
            authority: provider.authority.clone(),
            audience: "dotnet-api".to_string(),
            require_https_metadata: false,
            validate_issuer,
            ..Default::default()
        };
        JwtValidator::new(jwks_client, discovery, &options, Duration::from_secs(0))
    }

    fn claims(issuer: &str, audience: &str, expires_in: i64) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "iss": issuer,
            "aud": audience,
            "sub": "8c1e",
            "iat": now,
            "exp": now + expires_in,
            "preferred_username": "alice",
            "roles": ["demo-user"]
        })
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let provider = mock_identity_provider().await;
        let token = sign_token(&claims(&provider.authority, "dotnet-api", 300));

        let user = validator(&provider, true).validate_token(&token).await.unwrap();

        assert_eq!(user.name, "alice");
        assert_eq!(user.sub, "8c1e");
        assert_eq!(user.roles, vec!["demo-user"]);
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let provider = mock_identity_provider().await;
        let token = sign_token(&claims(&provider.authority, "account", 300));

        let err = validator(&provider, true).validate_token(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let provider = mock_identity_provider().await;
        let token = sign_token(&claims(&provider.authority, "dotnet-api", -600));

        assert!(validator(&provider, true).validate_token(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_issuer_check_follows_validate_issuer() {
        let provider = mock_identity_provider().await;
        let token = sign_token(&claims("https://elsewhere.example/realms/demo", "dotnet-api", 300));

        assert!(validator(&provider, true).validate_token(&token).await.is_err());
        assert!(validator(&provider, false).validate_token(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let provider = mock_identity_provider().await;

        let err = validator(&provider, true)
            .validate_token("not.a.jwt")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
