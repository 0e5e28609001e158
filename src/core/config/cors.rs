use super::env_list;
use crate::core::error::ConfigError;
use crate::shared::validation::is_blank;

/// Origins allowed to call the resource server from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    pub fn from_vars<F>(var: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            allowed_origins: env_list(var, "CORS__ALLOWED_ORIGINS").unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::NoCorsOrigins);
        }

        if self.allowed_origins.iter().any(|origin| is_blank(origin)) {
            return Err(ConfigError::BlankCorsOrigin);
        }

        Ok(())
    }
}
