//! Authentication for Gerrit
//!
//! Supports credentials from the config file and environment variables.

use crate::config::GerritConfig;
use crate::error::{Error, Result};
use std::env;

/// Environment variable holding the HTTP password
pub const PASSWORD_ENV: &str = "GERRIT_HTTP_PASSWORD";

/// Environment variable holding the HTTP username
pub const USERNAME_ENV: &str = "GERRIT_USERNAME";

/// Source of authentication credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Password from the config file
    ConfigFile,
    /// Password from environment variable
    EnvVar,
}

/// Gerrit authentication configuration
#[derive(Debug, Clone)]
pub struct GerritAuthConfig {
    /// Server root URL
    pub url: String,
    /// HTTP username
    pub username: String,
    /// HTTP password
    pub password: String,
    /// Where the password was obtained from
    pub source: AuthSource,
}

/// Get Gerrit authentication
///
/// Priority for the password:
/// 1. `http_password` in the config file
/// 2. `GERRIT_HTTP_PASSWORD` environment variable
///
/// The username falls back to `GERRIT_USERNAME`.
pub fn get_gerrit_auth(config: &GerritConfig) -> Result<GerritAuthConfig> {
    let url = config
        .url
        .clone()
        .ok_or_else(|| Error::Config("gerrit.url is not set".to_string()))?;

    let username = config
        .username
        .clone()
        .or_else(|| env::var(USERNAME_ENV).ok())
        .ok_or_else(|| {
            Error::Config(format!("gerrit.username is not set and {USERNAME_ENV} is empty"))
        })?;

    if let Some(password) = config.http_password.clone() {
        return Ok(GerritAuthConfig {
            url,
            username,
            password,
            source: AuthSource::ConfigFile,
        });
    }

    if let Ok(password) = env::var(PASSWORD_ENV) {
        return Ok(GerritAuthConfig {
            url,
            username,
            password,
            source: AuthSource::EnvVar,
        });
    }

    Err(Error::Config(format!(
        "No Gerrit HTTP password found. Set gerrit.http_password or {PASSWORD_ENV}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_password_wins() {
        let config = GerritConfig {
            url: Some("https://review.example.com".to_string()),
            username: Some("bot".to_string()),
            http_password: Some("secret".to_string()),
        };
        let auth = get_gerrit_auth(&config).unwrap();
        assert_eq!(auth.password, "secret");
        assert_eq!(auth.source, AuthSource::ConfigFile);
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let config = GerritConfig::default();
        assert!(matches!(get_gerrit_auth(&config), Err(Error::Config(_))));
    }
}
