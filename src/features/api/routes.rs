use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::middleware;
use crate::features::api::handler;
use crate::features::auth::JwtValidator;

/// Public routes (no authentication required)
pub fn public_routes() -> Router {
    Router::new().route("/ping", get(handler::ping))
}

/// Protected routes (require a valid bearer token)
pub fn protected_routes(validator: Arc<JwtValidator>) -> Router {
    Router::new()
        .route("/me", get(handler::get_me))
        .route_layer(axum::middleware::from_fn_with_state(
            validator,
            middleware::auth_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::KeycloakAuthenticationOptions;
    use crate::features::auth::JwksClient;
    use crate::features::oidc::DiscoveryClient;
    use crate::shared::test_helpers::{
        mock_identity_provider, sign_token, with_test_user, MockIdentityProvider,
    };
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::json;
    use std::time::Duration;

    fn validator(provider: &MockIdentityProvider) -> Arc<JwtValidator> {
        let discovery = Arc::new(DiscoveryClient::new(
            &provider.authority,
            false,
            Duration::from_secs(60),
        ));
        let jwks = Arc::new(JwksClient::new(discovery.clone(), Duration::from_secs(60)));
        let options = KeycloakAuthenticationOptions {
            authority: provider.authority.clone(),
            audience: "dotnet-api".to_string(),
            require_https_metadata: false,
            ..Default::default()
        };
        Arc::new(JwtValidator::new(jwks, discovery, &options, Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_ping_without_credentials() {
        let server = TestServer::new(public_routes()).expect("create test server");

        let response = server.get("/ping").await;

        response.assert_status_ok();
        response.assert_text("pong");
    }

    #[tokio::test]
    async fn test_me_without_bearer_token_is_unauthorized() {
        let provider = mock_identity_provider().await;
        let server =
            TestServer::new(protected_routes(validator(&provider))).expect("create test server");

        let response = server.get("/me").await;
        response.assert_status_unauthorized();

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_me_with_valid_token() {
        let provider = mock_identity_provider().await;
        let now = chrono::Utc::now().timestamp();
        let token = sign_token(&json!({
            "iss": provider.authority,
            "aud": "dotnet-api",
            "sub": "8c1e",
            "exp": now + 300,
            "preferred_username": "alice",
            "roles": ["demo-user", "reader"]
        }));
        let server =
            TestServer::new(protected_routes(validator(&provider))).expect("create test server");

        let response = server
            .get("/me")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "name": "alice",
            "roles": ["demo-user", "reader"]
        }));
    }

    #[tokio::test]
    async fn test_me_rejects_invalid_token() {
        let provider = mock_identity_provider().await;
        let server =
            TestServer::new(protected_routes(validator(&provider))).expect("create test server");

        let response = server
            .get("/me")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_handler_with_injected_user() {
        let app = with_test_user(Router::new().route("/me", get(handler::get_me)));
        let server = TestServer::new(app).expect("create test server");

        let response = server.get("/me").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "alice");
        assert_eq!(body["roles"], json!(["demo-user"]));
    }
}
