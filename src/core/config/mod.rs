//! Startup configuration for both services.
//!
//! Every record is loaded once from the process environment (with `.env`
//! support) and is immutable afterwards. Loading only parses; the
//! `validate` methods enforce the invariants and return the first
//! [`ConfigError`](crate::core::error::ConfigError) they hit.

mod cors;
mod endpoints;
mod keycloak;

pub use cors::CorsSettings;
pub use endpoints::ApiEndpointsOptions;
pub use keycloak::{KeycloakAuthenticationOptions, KeycloakClientOptions};

use std::env;
use std::time::Duration;

use crate::core::error::ConfigError;
use crate::shared::validation::is_static_route_path;

/// Resource-server (`demo-api`) configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub app: AppConfig,
    pub auth: KeycloakAuthenticationOptions,
    pub cors: CorsSettings,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
    pub swagger: SwaggerConfig,
}

/// Interactive client (`demo-web`) configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub app: AppConfig,
    pub auth: KeycloakClientOptions,
    pub endpoints: ApiEndpointsOptions,
    pub session_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL, used for OIDC redirect URIs.
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Load `.env` if present. A missing file is fine in production.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl ApiConfig {
    const DEFAULT_PORT: u16 = 5003;
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        load_dotenv();
        Self::from_vars(&process_env)
    }

    pub fn from_vars<F>(var: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: AppConfig::from_vars(var, Self::DEFAULT_PORT)?,
            auth: KeycloakAuthenticationOptions::from_vars(var)?,
            cors: CorsSettings::from_vars(var),
            jwks_cache_ttl: env_secs(var, "JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?,
            jwt_leeway: env_secs(var, "JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?,
            swagger: SwaggerConfig::from_vars(var),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.cors.validate()
    }
}

impl WebConfig {
    const DEFAULT_PORT: u16 = 5004;
    const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 3600;

    pub fn from_env() -> Result<Self, String> {
        load_dotenv();
        Self::from_vars(&process_env)
    }

    pub fn from_vars<F>(var: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: AppConfig::from_vars(var, Self::DEFAULT_PORT)?,
            auth: KeycloakClientOptions::from_vars(var)?,
            endpoints: ApiEndpointsOptions::from_vars(var),
            session_ttl: env_secs(var, "SESSION_TTL", Self::DEFAULT_SESSION_TTL_SECS)?,
        })
    }

    /// Routes the interactive client serves on its own.
    pub const BUILT_IN_PATHS: &'static [&'static str] =
        &["/", "/secure", "/call-api", "/login", "/logout"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.endpoints.validate()?;
        self.validate_callback_paths()
    }

    /// Both callback paths become routes, so each must be a literal path
    /// that clashes with nothing else on the router.
    fn validate_callback_paths(&self) -> Result<(), ConfigError> {
        const CALLBACK: &str = "Authentication.CallbackPath";
        const SIGNED_OUT: &str = "Authentication.SignedOutCallbackPath";

        let paths = [
            (CALLBACK, self.auth.callback_path.as_str()),
            (SIGNED_OUT, self.auth.signed_out_callback_path.as_str()),
        ];

        for (key, path) in paths {
            if !is_static_route_path(path) {
                return Err(ConfigError::InvalidCallbackPath { key });
            }

            if Self::BUILT_IN_PATHS.contains(&path) {
                return Err(ConfigError::ReservedCallbackPath { key });
            }
        }

        if self.auth.callback_path == self.auth.signed_out_callback_path {
            return Err(ConfigError::ReservedCallbackPath { key: SIGNED_OUT });
        }

        Ok(())
    }

    /// Absolute redirect URI registered with the identity provider.
    pub fn redirect_uri(&self) -> String {
        self.app.absolute_url(&self.auth.callback_path)
    }

    pub fn post_logout_redirect_uri(&self) -> String {
        self.app.absolute_url(&self.auth.signed_out_callback_path)
    }
}

impl AppConfig {
    fn from_vars<F>(var: &F, default_port: u16) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("Invalid PORT: {}", e))?,
            None => default_port,
        };
        let public_url = var("PUBLIC_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        Ok(Self {
            host,
            port,
            public_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), path)
    }
}

impl SwaggerConfig {
    fn from_vars<F>(var: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            title: var("SWAGGER_TITLE").unwrap_or_else(|| "Keycloak Demo API".to_string()),
            version: var("SWAGGER_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            description: var("SWAGGER_DESCRIPTION")
                .unwrap_or_else(|| "Resource server protected by Keycloak bearer tokens".to_string()),
        }
    }
}

/// Comma-separated list. Entries are trimmed; blank entries are kept so
/// validation can reject them. An empty value is an empty list.
pub(crate) fn env_list<F>(var: &F, key: &str) -> Option<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).map(|raw| {
        if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(|s| s.trim().to_string()).collect()
        }
    })
}

pub(crate) fn env_bool<F>(var: &F, key: &str, default: bool) -> Result<bool, String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("{} must be true or false", key)),
        },
    }
}

fn env_secs<F>(var: &F, key: &str, default: u64) -> Result<Duration, String>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match var(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("{} must be a valid number", key))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::from_vars(&lookup(HashMap::new())).unwrap();
        assert_eq!(config.app.host, "127.0.0.1");
        assert_eq!(config.app.port, 5003);
        assert_eq!(config.app.public_url, "http://127.0.0.1:5003");
        assert_eq!(config.jwks_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.jwt_leeway, Duration::from_secs(60));
        // Nothing required is configured, so authentication fails first
        assert_eq!(config.validate(), Err(ConfigError::InvalidAuthority));
    }

    #[test]
    fn test_api_config_validates_auth_before_cors() {
        let config = ApiConfig::from_vars(&lookup(HashMap::from([
            ("AUTHENTICATION__AUTHORITY", "http://localhost:8080/realms/demo"),
            ("AUTHENTICATION__AUDIENCE", "dotnet-api"),
        ])))
        .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::NoCorsOrigins));

        let config = ApiConfig::from_vars(&lookup(HashMap::from([
            ("AUTHENTICATION__AUTHORITY", "http://localhost:8080/realms/demo"),
            ("AUTHENTICATION__AUDIENCE", "dotnet-api"),
            ("CORS__ALLOWED_ORIGINS", "https://localhost:5001"),
        ])))
        .unwrap();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_web_config_validates_endpoints() {
        let config = WebConfig::from_vars(&lookup(HashMap::from([
            ("AUTHENTICATION__AUTHORITY", "http://localhost:8080/realms/demo"),
            ("AUTHENTICATION__CLIENT_ID", "dotnet-web"),
            ("ENDPOINTS__API_BASE_URL", "localhost-5002"),
        ])))
        .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidApiBaseUrl));
    }

    fn web_config_with_paths(callback: &'static str, signed_out: &'static str) -> WebConfig {
        WebConfig::from_vars(&lookup(HashMap::from([
            ("AUTHENTICATION__AUTHORITY", "http://localhost:8080/realms/demo"),
            ("AUTHENTICATION__CLIENT_ID", "dotnet-web"),
            ("ENDPOINTS__API_BASE_URL", "https://localhost:5002"),
            ("AUTHENTICATION__CALLBACK_PATH", callback),
            ("AUTHENTICATION__SIGNED_OUT_CALLBACK_PATH", signed_out),
        ])))
        .unwrap()
    }

    #[test]
    fn test_web_config_accepts_default_callback_paths() {
        let config = web_config_with_paths("/signin-oidc", "/signout-callback-oidc");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_web_config_rejects_unroutable_callback_paths() {
        for path in ["", "/", "signin-oidc", "/cb/{id}x", "/cb/:id"] {
            let config = web_config_with_paths(path, "/signout-callback-oidc");
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidCallbackPath {
                    key: "Authentication.CallbackPath"
                }),
                "callback path {path:?}"
            );
        }

        let config = web_config_with_paths("/signin-oidc", "");
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCallbackPath {
                key: "Authentication.SignedOutCallbackPath"
            })
        );
    }

    #[test]
    fn test_web_config_rejects_callback_paths_clashing_with_routes() {
        for path in ["/secure", "/call-api", "/login", "/logout"] {
            let config = web_config_with_paths(path, "/signout-callback-oidc");
            assert_eq!(
                config.validate(),
                Err(ConfigError::ReservedCallbackPath {
                    key: "Authentication.CallbackPath"
                }),
                "callback path {path:?}"
            );
        }

        let config = web_config_with_paths("/signin-oidc", "/logout");
        assert_eq!(
            config.validate(),
            Err(ConfigError::ReservedCallbackPath {
                key: "Authentication.SignedOutCallbackPath"
            })
        );

        let config = web_config_with_paths("/oidc", "/oidc");
        assert_eq!(
            config.validate(),
            Err(ConfigError::ReservedCallbackPath {
                key: "Authentication.SignedOutCallbackPath"
            })
        );
    }

    #[test]
    fn test_web_config_checks_endpoints_before_callback_paths() {
        let config = WebConfig::from_vars(&lookup(HashMap::from([
            ("AUTHENTICATION__AUTHORITY", "http://localhost:8080/realms/demo"),
            ("AUTHENTICATION__CLIENT_ID", "dotnet-web"),
            ("ENDPOINTS__API_BASE_URL", "localhost-5002"),
            ("AUTHENTICATION__CALLBACK_PATH", "/secure"),
        ])))
        .unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidApiBaseUrl));
    }

    #[test]
    fn test_web_config_redirect_uris() {
        let config = WebConfig::from_vars(&lookup(HashMap::from([
            ("PUBLIC_URL", "https://localhost:5001/"),
            ("AUTHENTICATION__CALLBACK_PATH", "/cb"),
        ])))
        .unwrap();
        assert_eq!(config.app.port, 5004);
        assert_eq!(config.redirect_uri(), "https://localhost:5001/cb");
        assert_eq!(
            config.post_logout_redirect_uri(),
            "https://localhost:5001/signout-callback-oidc"
        );
        assert_eq!(config.session_ttl, Duration::from_secs(8 * 3600));
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let err = ApiConfig::from_vars(&lookup(HashMap::from([("PORT", "http")]))).unwrap_err();
        assert!(err.starts_with("Invalid PORT"));

        let err =
            WebConfig::from_vars(&lookup(HashMap::from([("SESSION_TTL", "-1")]))).unwrap_err();
        assert_eq!(err, "SESSION_TTL must be a valid number");
    }

    #[test]
    fn test_env_list() {
        let var = lookup(HashMap::from([("EMPTY", "  "), ("LIST", "a, b ,c")]));
        assert_eq!(env_list(&var, "EMPTY"), Some(vec![]));
        assert_eq!(
            env_list(&var, "LIST"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(env_list(&var, "MISSING"), None);
    }

    #[test]
    fn test_env_bool() {
        let var = lookup(HashMap::from([("YES", "TRUE"), ("NO", "0"), ("BAD", "yes")]));
        assert_eq!(env_bool(&var, "YES", false), Ok(true));
        assert_eq!(env_bool(&var, "NO", true), Ok(false));
        assert_eq!(env_bool(&var, "MISSING", true), Ok(true));
        assert!(env_bool(&var, "BAD", true).is_err());
    }
}
