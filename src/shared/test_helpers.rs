use crate::features::auth::model::AuthenticatedUser;

use axum::{extract::Request, middleware::Next, response::Response, Router};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY_ID: &str = "test-key";

const TEST_PRIVATE_KEY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/test-fixtures/jwt_rsa_private.pem"
));

const TEST_JWKS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/test-fixtures/jwks.json"));

pub fn create_test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-sub".to_string(),
        name: "alice".to_string(),
        roles: vec!["demo-user".to_string()],
    }
}

async fn inject_test_user_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_test_user());
    next.run(request).await
}

pub fn with_test_user(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_test_user_middleware))
}

/// Sign `claims` with the fixture RSA key under [`TEST_KEY_ID`].
pub fn sign_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KEY_ID.to_string());

    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

pub fn provider_metadata_json(authority: &str) -> Value {
    json!({
        "issuer": authority,
        "authorization_endpoint": format!("{authority}/protocol/openid-connect/auth"),
        "token_endpoint": format!("{authority}/protocol/openid-connect/token"),
        "userinfo_endpoint": format!("{authority}/protocol/openid-connect/userinfo"),
        "jwks_uri": format!("{authority}/protocol/openid-connect/certs"),
        "end_session_endpoint": format!("{authority}/protocol/openid-connect/logout"),
    })
}

/// A Keycloak-shaped realm served by wiremock: discovery and JWKS are
/// mounted, token and userinfo endpoints are left to each test.
pub struct MockIdentityProvider {
    pub server: MockServer,
    pub authority: String,
}

pub async fn mock_identity_provider() -> MockIdentityProvider {
    let server = MockServer::start().await;
    let authority = format!("{}/realms/demo", server.uri());

    Mock::given(method("GET"))
        .and(path("/realms/demo/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_metadata_json(&authority)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/realms/demo/protocol/openid-connect/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(TEST_JWKS, "application/json"))
        .mount(&server)
        .await;

    MockIdentityProvider { server, authority }
}
