pub mod api;
pub mod auth;
pub mod oidc;
pub mod web;
