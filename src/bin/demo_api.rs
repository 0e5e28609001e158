use axum::Router;
use keycloak_demo::core::config::{self, ApiConfig};
use keycloak_demo::core::openapi::{ApiDoc, SwaggerInfoModifier};
use keycloak_demo::core::{middleware, server};
use keycloak_demo::features::api::routes as api_routes;
use keycloak_demo::features::auth::{JwksClient, JwtValidator};
use keycloak_demo::features::oidc::DiscoveryClient;
use std::sync::Arc;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    let (runtime, worker_threads) = server::build_runtime()?;
    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    config::load_dotenv();
    server::init_tracing();

    let config = ApiConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    tracing::info!(
        "Configuration loaded: authority={}, audience={}, tokio_worker_threads={}",
        config.auth.authority,
        config.auth.audience,
        worker_threads
    );

    // Initialize auth
    let discovery = Arc::new(DiscoveryClient::new(
        &config.auth.authority,
        config.auth.require_https_metadata,
        config.jwks_cache_ttl,
    ));
    let jwks_client = Arc::new(JwksClient::new(discovery.clone(), config.jwks_cache_ttl));
    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        discovery,
        &config.auth,
        config.jwt_leeway,
    ));
    tracing::info!("Bearer token validation initialized");

    let mut openapi = ApiDoc::openapi();
    SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    }
    .modify(&mut openapi);

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .merge(api_routes::protected_routes(jwt_validator))
        .merge(api_routes::public_routes())
        .merge(health_route)
        .layer(middleware::cors_layer(&config.cors));
    let app = server::with_http_layers(app);

    let addr = config.app.server_address();
    let listener = server::bind_listener(&addr)?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    server::serve(listener, app).await
}
