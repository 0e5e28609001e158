use super::{env_bool, env_list};
use crate::core::error::ConfigError;
use crate::shared::validation::{is_absolute_uri, is_blank};

pub const DEFAULT_NAME_CLAIM_TYPE: &str = "preferred_username";
pub const DEFAULT_ROLE_CLAIM_TYPE: &str = "roles";

/// Resource-server side of the Keycloak integration (bearer validation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakAuthenticationOptions {
    pub authority: String,
    pub audience: String,
    pub require_https_metadata: bool,
    pub validate_issuer: bool,
    pub name_claim_type: String,
    pub role_claim_type: String,
}

impl Default for KeycloakAuthenticationOptions {
    fn default() -> Self {
        Self {
            authority: String::new(),
            audience: String::new(),
            require_https_metadata: true,
            validate_issuer: true,
            name_claim_type: DEFAULT_NAME_CLAIM_TYPE.to_string(),
            role_claim_type: DEFAULT_ROLE_CLAIM_TYPE.to_string(),
        }
    }
}

impl KeycloakAuthenticationOptions {
    pub fn from_vars<F>(var: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            authority: var("AUTHENTICATION__AUTHORITY").unwrap_or(defaults.authority),
            audience: var("AUTHENTICATION__AUDIENCE").unwrap_or(defaults.audience),
            require_https_metadata: env_bool(
                var,
                "AUTHENTICATION__REQUIRE_HTTPS_METADATA",
                defaults.require_https_metadata,
            )?,
            validate_issuer: env_bool(
                var,
                "AUTHENTICATION__VALIDATE_ISSUER",
                defaults.validate_issuer,
            )?,
            name_claim_type: var("AUTHENTICATION__NAME_CLAIM_TYPE")
                .unwrap_or(defaults.name_claim_type),
            role_claim_type: var("AUTHENTICATION__ROLE_CLAIM_TYPE")
                .unwrap_or(defaults.role_claim_type),
        })
    }

    /// Checks run in a fixed order; the first failure is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_absolute_uri(&self.authority) {
            return Err(ConfigError::InvalidAuthority);
        }

        if is_blank(&self.audience) {
            return Err(ConfigError::MissingAudience);
        }

        if is_blank(&self.name_claim_type) {
            return Err(ConfigError::MissingNameClaimType);
        }

        if is_blank(&self.role_claim_type) {
            return Err(ConfigError::MissingRoleClaimType);
        }

        Ok(())
    }
}

/// Interactive client side of the Keycloak integration (authorization code login).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakClientOptions {
    pub authority: String,
    pub client_id: String,
    /// Only sent for confidential clients.
    pub client_secret: Option<String>,
    pub response_type: Option<String>,
    pub callback_path: String,
    pub signed_out_callback_path: String,
    pub require_https_metadata: bool,
    pub name_claim_type: String,
    pub role_claim_type: String,
    pub scopes: Vec<String>,
}

impl Default for KeycloakClientOptions {
    fn default() -> Self {
        Self {
            authority: String::new(),
            client_id: String::new(),
            client_secret: None,
            response_type: Some(Self::DEFAULT_RESPONSE_TYPE.to_string()),
            callback_path: "/signin-oidc".to_string(),
            signed_out_callback_path: "/signout-callback-oidc".to_string(),
            require_https_metadata: true,
            name_claim_type: DEFAULT_NAME_CLAIM_TYPE.to_string(),
            role_claim_type: DEFAULT_ROLE_CLAIM_TYPE.to_string(),
            scopes: vec!["openid".to_string()],
        }
    }
}

impl KeycloakClientOptions {
    pub const DEFAULT_RESPONSE_TYPE: &'static str = "code";

    pub fn from_vars<F>(var: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            authority: var("AUTHENTICATION__AUTHORITY").unwrap_or(defaults.authority),
            client_id: var("AUTHENTICATION__CLIENT_ID").unwrap_or(defaults.client_id),
            client_secret: var("AUTHENTICATION__CLIENT_SECRET").filter(|s| !s.is_empty()),
            response_type: var("AUTHENTICATION__RESPONSE_TYPE").or(defaults.response_type),
            callback_path: var("AUTHENTICATION__CALLBACK_PATH").unwrap_or(defaults.callback_path),
            signed_out_callback_path: var("AUTHENTICATION__SIGNED_OUT_CALLBACK_PATH")
                .unwrap_or(defaults.signed_out_callback_path),
            require_https_metadata: env_bool(
                var,
                "AUTHENTICATION__REQUIRE_HTTPS_METADATA",
                defaults.require_https_metadata,
            )?,
            name_claim_type: var("AUTHENTICATION__NAME_CLAIM_TYPE")
                .unwrap_or(defaults.name_claim_type),
            role_claim_type: var("AUTHENTICATION__ROLE_CLAIM_TYPE")
                .unwrap_or(defaults.role_claim_type),
            scopes: env_list(var, "AUTHENTICATION__SCOPES").unwrap_or(defaults.scopes),
        })
    }

    /// Checks run in a fixed order; the first failure is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_absolute_uri(&self.authority) {
            return Err(ConfigError::InvalidAuthority);
        }

        if is_blank(&self.client_id) {
            return Err(ConfigError::MissingClientId);
        }

        if self.scopes.is_empty() || self.scopes.iter().any(|scope| is_blank(scope)) {
            return Err(ConfigError::InvalidScopes);
        }

        if is_blank(&self.name_claim_type) {
            return Err(ConfigError::MissingNameClaimType);
        }

        if is_blank(&self.role_claim_type) {
            return Err(ConfigError::MissingRoleClaimType);
        }

        Ok(())
    }

    /// Response type sent on the authorization request.
    pub fn response_type(&self) -> &str {
        self.response_type
            .as_deref()
            .filter(|s| !is_blank(s))
            .unwrap_or(Self::DEFAULT_RESPONSE_TYPE)
    }
}
