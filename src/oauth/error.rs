//! Authentication/authorization errors and `WWW-Authenticate` construction.
//!
//! Every variant is a *denial*: the request is well-formed enough to
//! answer, and the answer is 401 or 403. Bearer error parameters follow
//! RFC 6750 Section 3; OAuth 1 challenges carry only the realm.

use super::scope::Scope;

/// Challenge scheme for OAuth 2 bearer tokens.
pub const BEARER_SCHEME: &str = "Bearer";
/// Challenge scheme for OAuth 1 tokens.
pub const OAUTH1_SCHEME: &str = "OAuth";

/// Why a request was not let through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// No token was resolved for the request. HTTP 401.
    #[error("Authentication credentials were not provided")]
    MissingToken,

    /// The credential was malformed or the provider did not recognise it.
    /// HTTP 401 with `error="invalid_token"`.
    #[error("Invalid token: {description}")]
    InvalidToken { description: String },

    /// The token was recognised but is past its expiry. HTTP 401 with
    /// `error="invalid_token"`.
    #[error("Invalid token: token has expired")]
    ExpiredToken,

    /// A scoped token lacks the capability the method requires. HTTP 403
    /// with `error="insufficient_scope"`.
    #[error("Insufficient scope: required {required}, granted {granted}")]
    InsufficientScope { required: Scope, granted: Scope },

    /// A legacy token is bound to a read-only resource and the method is
    /// unsafe. HTTP 403.
    #[error("Resource '{resource}' is read-only")]
    ReadOnlyResource { resource: String },
}

impl OAuthError {
    pub fn invalid_token(description: impl Into<String>) -> Self {
        OAuthError::InvalidToken {
            description: description.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// - 401 Unauthorized when no valid token is present
    /// - 403 Forbidden when the token is valid but not allowed
    pub fn status_code(&self) -> u16 {
        match self {
            OAuthError::InsufficientScope { .. } | OAuthError::ReadOnlyResource { .. } => 403,
            _ => 401,
        }
    }

    /// True for denials of an authenticated request.
    pub fn is_forbidden(&self) -> bool {
        self.status_code() == 403
    }

    /// The challenge scheme a client holding the offending token expects.
    ///
    /// Only a read-only resource denial is known to come from an OAuth 1
    /// token; everything else is answered with a bearer challenge unless
    /// the caller knows better (see [`challenge`](Self::challenge)).
    pub fn scheme(&self) -> &'static str {
        match self {
            OAuthError::ReadOnlyResource { .. } => OAUTH1_SCHEME,
            _ => BEARER_SCHEME,
        }
    }

    /// Builds the `WWW-Authenticate` header value for [`scheme`](Self::scheme).
    pub fn www_authenticate(&self, realm: &str) -> String {
        self.challenge(self.scheme(), realm)
    }

    /// Builds the `WWW-Authenticate` header value for an explicit scheme.
    ///
    /// An `OAuth` challenge carries only the realm (RFC 5849 Section 3.2).
    /// A `Bearer` challenge adds RFC 6750 Section 3 error parameters.
    /// Quoted values are escaped, so any realm yields a well-formed header.
    pub fn challenge(&self, scheme: &str, realm: &str) -> String {
        let mut parts = vec![format!("realm={}", quoted(realm))];

        if scheme.eq_ignore_ascii_case(OAUTH1_SCHEME) {
            return format!("{} {}", OAUTH1_SCHEME, parts.join(", "));
        }

        match self {
            // RFC 6750 Section 3: no error code when the request carried no
            // authentication information at all.
            OAuthError::MissingToken => {}
            OAuthError::InvalidToken { description } => {
                parts.push("error=\"invalid_token\"".to_string());
                parts.push(format!("error_description={}", quoted(description)));
            }
            OAuthError::ExpiredToken => {
                parts.push("error=\"invalid_token\"".to_string());
                parts.push("error_description=\"The access token has expired\"".to_string());
            }
            OAuthError::InsufficientScope { required, .. } => {
                parts.push("error=\"insufficient_scope\"".to_string());
                parts.push(format!("scope=\"{}\"", required.names().join(" ")));
            }
            OAuthError::ReadOnlyResource { .. } => {
                parts.push("error=\"insufficient_scope\"".to_string());
            }
        }

        format!("{} {}", BEARER_SCHEME, parts.join(", "))
    }
}

/// RFC 9110 quoted-string: `"` and `\` are backslash-escaped.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
