use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::auth::AuthenticatedUser;

/// DTO for /me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    pub name: String,
    pub roles: Vec<String>,
}

impl From<AuthenticatedUser> for MeResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            name: user.name,
            roles: user.roles,
        }
    }
}
