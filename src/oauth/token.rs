//! Resolved tokens and the provider that resolves them.
//!
//! A [`Token`] is what the authentication layer hands to the permission
//! checker. It is either an OAuth 1 [`LegacyToken`], bound to a
//! [`Resource`] with a read-only flag, or an OAuth 2 [`ScopedToken`]
//! carrying a [`Scope`] bitmask. Tokens are plain data: inspecting them
//! never performs I/O.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::OAuthError;
use super::scope::Scope;
use crate::auth::Credential;

/// The protected resource an OAuth 1 token was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    /// Unsafe methods are refused when set.
    #[serde(default)]
    pub is_readonly: bool,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_readonly: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.is_readonly = true;
        self
    }
}

/// An OAuth 1 access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyToken {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub resource: Resource,
}

impl LegacyToken {
    pub fn new(key: impl Into<String>, resource: Resource) -> Self {
        Self {
            key: key.into(),
            user: None,
            resource,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// An OAuth 2 access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub scope: Scope,
    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
}

impl ScopedToken {
    pub fn new(token: impl Into<String>, scope: Scope) -> Self {
        Self {
            token: token.into(),
            user: None,
            client_id: None,
            scope,
            expires: None,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn expires_at(mut self, unix_secs: u64) -> Self {
        self.expires = Some(unix_secs);
        self
    }

    /// Check if the token has expired based on the current time.
    pub fn is_expired(&self) -> bool {
        match self.expires {
            Some(exp) => {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                now >= exp
            }
            None => false,
        }
    }
}

/// An authenticated token, as resolved by a [`TokenProvider`].
///
/// Inserted into request extensions by
/// [`AuthenticationLayer`](super::AuthenticationLayer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Legacy(LegacyToken),
    Scoped(ScopedToken),
}

impl Token {
    /// The raw token string.
    pub fn key(&self) -> &str {
        match self {
            Token::Legacy(token) => &token.key,
            Token::Scoped(token) => &token.token,
        }
    }

    pub fn user(&self) -> Option<&str> {
        match self {
            Token::Legacy(token) => token.user.as_deref(),
            Token::Scoped(token) => token.user.as_deref(),
        }
    }
}

impl From<LegacyToken> for Token {
    fn from(token: LegacyToken) -> Self {
        Token::Legacy(token)
    }
}

impl From<ScopedToken> for Token {
    fn from(token: ScopedToken) -> Self {
        Token::Scoped(token)
    }
}

/// Trait for resolving request credentials into tokens.
///
/// This is the seam to an OAuth provider: database lookup, token
/// introspection, OAuth 1 signature verification and so on all happen
/// behind it.
///
/// # Example
///
/// ```rust
/// use tower_rw_scope::auth::Credential;
/// use tower_rw_scope::oauth::{OAuthError, Scope, ScopedToken, Token, TokenProvider};
///
/// #[derive(Clone)]
/// struct EveryoneReads;
///
/// impl TokenProvider for EveryoneReads {
///     async fn resolve(&self, credential: &Credential) -> Result<Token, OAuthError> {
///         match credential {
///             Credential::Bearer(t) => Ok(ScopedToken::new(t.clone(), Scope::READ).into()),
///             Credential::OAuth1 { .. } => Err(OAuthError::invalid_token("OAuth 1 not supported")),
///         }
///     }
/// }
/// ```
pub trait TokenProvider: Clone + Send + Sync + 'static {
    /// Resolve a credential to a token.
    ///
    /// Returns [`OAuthError::InvalidToken`] or [`OAuthError::ExpiredToken`]
    /// if the credential does not name a usable token.
    fn resolve(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<Token, OAuthError>> + Send;
}

/// In-memory token provider.
///
/// Bearer credentials resolve only to scoped tokens and OAuth 1
/// credentials only to legacy tokens. For tests, demos and fixed service
/// credentials; a real deployment would query its OAuth provider.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    tokens: Arc<HashMap<String, Token>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token under its key.
    pub fn token(mut self, token: impl Into<Token>) -> Self {
        let token = token.into();
        Arc::make_mut(&mut self.tokens).insert(token.key().to_string(), token);
        self
    }

    /// Forget a token held by this provider.
    ///
    /// The token table is copy-on-write: clones already handed to a layer
    /// keep their own table and still resolve the token. Revoke before
    /// building layers, or use a [`TokenProvider`] backed by shared storage.
    pub fn revoke(&mut self, key: &str) -> Option<Token> {
        Arc::make_mut(&mut self.tokens).remove(key)
    }

    /// Load tokens from a JSON array of [`Token`] objects.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let tokens: Vec<Token> = serde_json::from_str(json)?;
        Ok(tokens
            .into_iter()
            .fold(Self::new(), |provider, token| provider.token(token)))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn resolve(&self, credential: &Credential) -> Result<Token, OAuthError> {
        let token = self
            .tokens
            .get(credential.token())
            .ok_or_else(|| OAuthError::invalid_token("Invalid token"))?;

        match (credential, token) {
            (Credential::Bearer(_), Token::Scoped(scoped)) => {
                if scoped.is_expired() {
                    return Err(OAuthError::ExpiredToken);
                }
                Ok(token.clone())
            }
            (Credential::OAuth1 { .. }, Token::Legacy(_)) => Ok(token.clone()),
            _ => Err(OAuthError::invalid_token("Invalid token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticTokenProvider {
        StaticTokenProvider::new()
            .token(ScopedToken::new("access_token", Scope::READ_WRITE).user("john"))
            .token(ScopedToken::new("stale", Scope::READ).expires_at(1))
            .token(LegacyToken::new("oauth1-token", Resource::new("photos").read_only()))
    }

    fn oauth1(token: &str) -> Credential {
        Credential::OAuth1 {
            token: token.to_string(),
            params: Default::default(),
        }
    }

    #[test]
    fn test_scoped_token_expiry() {
        assert!(!ScopedToken::new("t", Scope::READ).is_expired());
        assert!(ScopedToken::new("t", Scope::READ).expires_at(1).is_expired());
        assert!(
            !ScopedToken::new("t", Scope::READ)
                .expires_at(u64::MAX)
                .is_expired()
        );
    }

    #[test]
    fn test_token_accessors() {
        let token: Token = ScopedToken::new("abc", Scope::READ).user("john").into();
        assert_eq!(token.key(), "abc");
        assert_eq!(token.user(), Some("john"));

        let token: Token = LegacyToken::new("def", Resource::new("r")).into();
        assert_eq!(token.key(), "def");
        assert_eq!(token.user(), None);
    }

    #[test]
    fn test_token_serde_is_tagged() {
        let token: Token = ScopedToken::new("abc", Scope::READ).into();
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["type"], "scoped");
        assert_eq!(json["scope"], "read");

        let token: Token = serde_json::from_value(serde_json::json!({
            "type": "legacy",
            "key": "k",
            "resource": {"name": "photos", "is_readonly": true}
        }))
        .unwrap();
        let Token::Legacy(legacy) = token else {
            panic!("Expected legacy token");
        };
        assert!(legacy.resource.is_readonly);
    }

    #[tokio::test]
    async fn test_static_provider_resolves_bearer() {
        let token = provider()
            .resolve(&Credential::Bearer("access_token".to_string()))
            .await
            .unwrap();
        assert!(matches!(token, Token::Scoped(ref t) if t.scope == Scope::READ_WRITE));
    }

    #[tokio::test]
    async fn test_static_provider_resolves_oauth1() {
        let token = provider().resolve(&oauth1("oauth1-token")).await.unwrap();
        assert!(matches!(token, Token::Legacy(_)));
    }

    #[tokio::test]
    async fn test_static_provider_unknown_token() {
        let err = provider()
            .resolve(&Credential::Bearer("wrong-token".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, OAuthError::invalid_token("Invalid token"));
    }

    #[tokio::test]
    async fn test_static_provider_expired_token() {
        let err = provider()
            .resolve(&Credential::Bearer("stale".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, OAuthError::ExpiredToken);
    }

    #[tokio::test]
    async fn test_static_provider_scheme_mismatch() {
        let provider = provider();
        assert!(
            provider
                .resolve(&Credential::Bearer("oauth1-token".to_string()))
                .await
                .is_err()
        );
        assert!(provider.resolve(&oauth1("access_token")).await.is_err());
    }

    #[tokio::test]
    async fn test_static_provider_revoke() {
        let mut provider = provider();
        assert!(provider.revoke("access_token").is_some());
        assert_eq!(provider.len(), 2);
        assert!(
            provider
                .resolve(&Credential::Bearer("access_token".to_string()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_revoke_only_affects_this_handle() {
        let mut provider = provider();
        let earlier = provider.clone();
        provider.revoke("access_token");

        let credential = Credential::Bearer("access_token".to_string());
        assert!(provider.resolve(&credential).await.is_err());
        assert!(earlier.resolve(&credential).await.is_ok());
        assert!(provider.clone().resolve(&credential).await.is_err());
    }

    #[test]
    fn test_static_provider_from_json() {
        let provider = StaticTokenProvider::from_json(
            r#"[
                {"type": "scoped", "token": "a", "scope": "read+write"},
                {"type": "legacy", "key": "b", "resource": {"name": "photos"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(provider.len(), 2);
        assert!(!provider.is_empty());

        assert!(StaticTokenProvider::from_json(r#"[{"type": "other"}]"#).is_err());
    }
}
