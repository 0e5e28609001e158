//! Resource-server endpoints.
//!
//! | Method | Endpoint | Auth   | Description                      |
//! |--------|----------|--------|----------------------------------|
//! | GET    | `/ping`  | none   | Liveness text, always `pong`     |
//! | GET    | `/me`    | bearer | Name and roles of the token user |

pub mod dto;
pub mod handler;
pub mod routes;
