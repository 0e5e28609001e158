mod jwks;
mod validator;

pub mod model;

pub use jwks::{JwksClient, JwksError};
pub use model::AuthenticatedUser;
pub use validator::JwtValidator;
