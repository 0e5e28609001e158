use axum::{routing::get, Router};

use super::handler;
use super::state::WebState;

/// All interactive-client routes. The callback paths come from a
/// configuration that passed `WebConfig::validate`.
pub fn routes(state: WebState, callback_path: &str, signed_out_callback_path: &str) -> Router {
    Router::new()
        .route("/", get(handler::index))
        .route("/secure", get(handler::secure))
        .route("/call-api", get(handler::call_api))
        .route("/login", get(handler::login))
        .route("/logout", get(handler::logout))
        .route(callback_path, get(handler::signin_callback))
        .route(signed_out_callback_path, get(handler::signed_out_callback))
        .with_state(state)
}
