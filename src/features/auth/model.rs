use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Claims of a token or userinfo document, keyed by claim name.
pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Build a user from raw claims using the configured claim types.
    ///
    /// The name falls back to `sub`, then to `"unknown"`. Roles accept a
    /// single string or an array of strings; anything else counts as none.
    pub fn from_claims(claims: &Claims, name_claim_type: &str, role_claim_type: &str) -> Self {
        let sub = claims
            .get("sub")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let name = find_claim(claims, name_claim_type)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| (!sub.is_empty()).then(|| sub.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        let roles = match find_claim(claims, role_claim_type) {
            Some(Value::String(role)) => vec![role.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Self { sub, name, roles }
    }
}

/// Exact claim name first, then a dotted path into nested objects
/// (Keycloak puts realm roles under `realm_access.roles`).
fn find_claim<'a>(claims: &'a Claims, claim_type: &str) -> Option<&'a Value> {
    if let Some(value) = claims.get(claim_type) {
        return Some(value);
    }

    let mut segments = claim_type.split('.');
    let mut current = claims.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
