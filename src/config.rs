//! Middleware configuration.

use axum::http::HeaderName;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Settings shared by the authentication and permission layers.
///
/// Build it in code:
///
/// ```rust
/// use tower_rw_scope::config::OAuthConfig;
///
/// let config = OAuthConfig::new().realm("photos").allow_query_params_token(true);
/// assert_eq!(config.realm, "photos");
/// ```
///
/// or load it from JSON, where every field is optional:
///
/// ```rust
/// use tower_rw_scope::config::OAuthConfig;
///
/// let config = OAuthConfig::from_json(r#"{"realm": "photos"}"#).unwrap();
/// assert!(!config.allow_query_params_token);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Realm reported in `WWW-Authenticate` challenges.
    pub realm: String,
    /// Accept an OAuth 2 token from the `access_token` query parameter.
    ///
    /// Tokens in URLs end up in logs and browser history; keep this off
    /// outside of debugging.
    pub allow_query_params_token: bool,
    /// Accept an OAuth 2 token from the `access_token` field of an
    /// `application/x-www-form-urlencoded` request body.
    pub allow_form_body_token: bool,
    /// Largest form body buffered while looking for `access_token`.
    pub max_form_body_bytes: usize,
    /// Header carrying the credential.
    pub header_name: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            realm: "api".to_string(),
            allow_query_params_token: false,
            allow_form_body_token: true,
            max_form_body_bytes: 64 * 1024,
            header_name: "authorization".to_string(),
        }
    }
}

impl OAuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn allow_query_params_token(mut self, allow: bool) -> Self {
        self.allow_query_params_token = allow;
        self
    }

    pub fn allow_form_body_token(mut self, allow: bool) -> Self {
        self.allow_form_body_token = allow;
        self
    }

    pub fn max_form_body_bytes(mut self, limit: usize) -> Self {
        self.max_form_body_bytes = limit;
        self
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the realm and header name can be put on the wire.
    ///
    /// Quotes in the realm are escaped when a challenge is built; control
    /// and non-ASCII characters cannot be, so they are rejected here.
    pub fn validate(&self) -> Result<()> {
        if !self.realm.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
            return Err(Error::config(
                "realm must contain only visible ASCII characters and spaces",
            ));
        }
        HeaderName::from_bytes(self.header_name.as_bytes())
            .map_err(|_| Error::config(format!("invalid header name '{}'", self.header_name)))?;
        Ok(())
    }
}
