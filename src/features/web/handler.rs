use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::oidc_client::Pkce;
use super::session::{expired_session_cookie, session_cookie, PendingLogin};
use super::state::{MaybeSession, WebState};
use crate::core::error::{AppError, Result};
use crate::shared::types::ProblemDetails;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Keycloak Demo</title></head>
<body>
<h1>Keycloak Demo</h1>
<ul>
<li><a href="/secure">Secure page</a></li>
<li><a href="/call-api">Call the protected API</a></li>
<li><a href="/logout">Sign out</a></li>
</ul>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn secure(MaybeSession(session): MaybeSession) -> Response {
    match session {
        Some((_, session)) => format!(
            "Hello, {}! You are authenticated via Keycloak.",
            session.user.name
        )
        .into_response(),
        None => challenge("/secure"),
    }
}

pub async fn call_api(
    State(state): State<WebState>,
    MaybeSession(session): MaybeSession,
) -> Result<Response> {
    let Some((_, session)) = session else {
        return Ok(challenge("/call-api"));
    };

    let Some(access_token) = session.access_token.filter(|t| !t.is_empty()) else {
        return Ok(
            ProblemDetails::new(StatusCode::UNAUTHORIZED, "No access token available.")
                .into_response(),
        );
    };

    let result = state.api.get_me(&access_token).await?;

    Ok(format!("API Response ({}):\n{}", result.status.as_u16(), result.body).into_response())
}

pub async fn login(
    State(state): State<WebState>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
    let return_url = local_return_url(query.return_url.as_deref());
    let login_state = Uuid::new_v4().simple().to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    let pkce = Pkce::generate();

    let url = state
        .oidc
        .authorization_url(&login_state, &nonce, &pkce)
        .await?;

    state
        .sessions
        .begin_login(
            login_state,
            PendingLogin {
                code_verifier: pkce.verifier,
                nonce,
                return_url,
                created_at: Utc::now(),
            },
        )
        .await;

    Ok(Redirect::to(&url))
}

pub async fn signin_callback(
    State(state): State<WebState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        let detail = query
            .error_description
            .map(|d| format!("{}: {}", error, d))
            .unwrap_or(error);
        return Err(AppError::Auth(format!("Identity provider error: {}", detail)));
    }

    let (Some(code), Some(login_state)) = (query.code, query.state) else {
        return Err(AppError::BadRequest(
            "Missing code or state parameter".to_string(),
        ));
    };

    let pending = state
        .sessions
        .take_login(&login_state)
        .await
        .ok_or_else(|| AppError::BadRequest("Unknown or expired login state".to_string()))?;

    let signed_in = state
        .oidc
        .complete_login(&code, &pending.code_verifier, &pending.nonce)
        .await?;

    let session_id = state
        .sessions
        .create(
            signed_in.user,
            Some(signed_in.access_token),
            Some(signed_in.id_token),
        )
        .await;

    let cookie = session_cookie(session_id, state.sessions.ttl(), state.secure_cookies);

    Ok((jar.add(cookie), Redirect::to(&pending.return_url)).into_response())
}

pub async fn logout(
    State(state): State<WebState>,
    jar: CookieJar,
    MaybeSession(session): MaybeSession,
) -> Result<Response> {
    let id_token = match session {
        Some((id, _)) => state.sessions.remove(&id).await.and_then(|s| s.id_token),
        None => None,
    };

    let target = state
        .oidc
        .end_session_url(id_token.as_deref())
        .await?
        .unwrap_or_else(|| "/".to_string());

    Ok((
        jar.add(expired_session_cookie(state.secure_cookies)),
        Redirect::to(&target),
    )
        .into_response())
}

pub async fn signed_out_callback() -> Redirect {
    Redirect::to("/")
}

/// Redirect an anonymous caller to the login endpoint. `return_url` is one
/// of this module's own route paths.
fn challenge(return_url: &str) -> Response {
    Redirect::to(&format!("/login?return_url={}", return_url)).into_response()
}

/// Only same-site paths are accepted as post-login targets.
fn local_return_url(candidate: Option<&str>) -> String {
    match candidate {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") => {
            url.to_string()
        }
        _ => "/".to_string(),
    }
}
