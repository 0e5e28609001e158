use axum::Json;

use crate::features::api::dto::MeResponseDto;
use crate::features::auth::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    ),
    tag = "api"
)]
pub async fn ping() -> &'static str {
    "pong"
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user resolved from the bearer token", body = MeResponseDto),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "api",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(user: AuthenticatedUser) -> Json<MeResponseDto> {
    tracing::debug!("Resolved /me for {}", user.name);
    Json(MeResponseDto::from(user))
}
