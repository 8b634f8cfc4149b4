//! Credential extraction from HTTP requests.
//!
//! Two credential forms are recognised:
//!
//! - `Authorization: Bearer <token>` (OAuth 2)
//! - `Authorization: OAuth oauth_token="...", ...` (OAuth 1)
//!
//! An OAuth 2 token may also travel as an `access_token` field of an
//! `application/x-www-form-urlencoded` body, or, when
//! [`OAuthConfig::allow_query_params_token`](crate::config::OAuthConfig) is
//! set, as an `access_token` query parameter.
//!
//! Extraction only parses. Whether a credential names a live token is the
//! [`TokenProvider`](crate::oauth::TokenProvider)'s job.

use std::collections::{BTreeMap, HashMap};

use axum::Form;
use axum::body::Body;
use axum::extract::{FromRequest, Query};
use axum::http::{HeaderValue, Method, Request, Uri, header};

use crate::oauth::OAuthError;
use crate::oauth::error::{BEARER_SCHEME, OAUTH1_SCHEME};

/// Name of the query parameter or form field carrying an OAuth 2 access token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A credential pulled out of a request, not yet resolved to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// OAuth 2 bearer access token.
    Bearer(String),
    /// OAuth 1 access token plus every protocol parameter from the header.
    ///
    /// Signature verification over `params` is left to the provider.
    OAuth1 {
        token: String,
        params: BTreeMap<String, String>,
    },
}

impl Credential {
    /// The raw token string, whatever the scheme.
    pub fn token(&self) -> &str {
        match self {
            Credential::Bearer(token) => token,
            Credential::OAuth1 { token, .. } => token,
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Credential::Bearer(_) => BEARER_SCHEME,
            Credential::OAuth1 { .. } => OAUTH1_SCHEME,
        }
    }
}

/// Parse an `Authorization` header value.
///
/// Returns `Ok(None)` when the header uses a scheme this crate does not
/// handle, so the request can continue anonymously. A recognised scheme
/// with a malformed payload is an [`OAuthError::InvalidToken`].
///
/// ```rust
/// use tower_rw_scope::auth::{extract_credential, Credential};
///
/// assert_eq!(
///     extract_credential("Bearer abc123").unwrap(),
///     Some(Credential::Bearer("abc123".to_string()))
/// );
/// assert!(extract_credential("Bearer").is_err());
/// assert_eq!(extract_credential("Basic dXNlcjpwYXNz").unwrap(), None);
/// ```
pub fn extract_credential(auth_header: &str) -> Result<Option<Credential>, OAuthError> {
    let auth_header = auth_header.trim();
    let mut words = auth_header.split_whitespace();

    let Some(scheme) = words.next() else {
        return Ok(None);
    };

    if scheme.eq_ignore_ascii_case("bearer") {
        let token = words.next().ok_or_else(|| {
            OAuthError::invalid_token("Invalid bearer header. No credentials provided.")
        })?;
        if words.next().is_some() {
            return Err(OAuthError::invalid_token(
                "Invalid bearer header. Token string should not contain spaces.",
            ));
        }
        return Ok(Some(Credential::Bearer(token.to_string())));
    }

    if scheme.eq_ignore_ascii_case("oauth") {
        let params = parse_oauth1_params(auth_header[scheme.len()..].trim())?;
        let token = params
            .get("oauth_token")
            .filter(|t| !t.is_empty())
            .cloned()
            .ok_or_else(|| OAuthError::invalid_token("Missing OAuth token."))?;
        return Ok(Some(Credential::OAuth1 { token, params }));
    }

    Ok(None)
}

/// Extract a bearer credential from the `access_token` query parameter.
pub fn extract_query_token(uri: &Uri) -> Option<Credential> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .get(ACCESS_TOKEN_PARAM)
        .filter(|t| !t.is_empty())
        .map(|t| Credential::Bearer(t.clone()))
}

/// True for requests whose body may carry an `access_token` form field.
///
/// GET and HEAD bodies are never read.
pub fn is_form_request(req: &Request<Body>) -> bool {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        return false;
    }
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Extract a bearer credential from the `access_token` form field.
///
/// Buffers at most `limit` bytes of body and puts them back, so the
/// returned request still carries the full body for the handler. A body
/// that is not valid form data yields no credential.
pub async fn extract_form_token(
    req: Request<Body>,
    limit: usize,
) -> Result<(Request<Body>, Option<Credential>), axum::Error> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await?;

    let mut form_req = Request::new(Body::from(bytes.clone()));
    *form_req.method_mut() = parts.method.clone();
    form_req.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(FORM_CONTENT_TYPE),
    );

    let credential = match Form::<HashMap<String, String>>::from_request(form_req, &()).await {
        Ok(Form(fields)) => fields
            .get(ACCESS_TOKEN_PARAM)
            .filter(|t| !t.is_empty())
            .map(|t| Credential::Bearer(t.clone())),
        Err(_) => None,
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), credential))
}

/// The challenge scheme matching the scheme an `Authorization` header uses.
pub fn header_scheme(auth_header: &str) -> &'static str {
    match auth_header.split_whitespace().next() {
        Some(scheme) if scheme.eq_ignore_ascii_case(OAUTH1_SCHEME) => OAUTH1_SCHEME,
        _ => BEARER_SCHEME,
    }
}

/// Parse the comma-separated `key="value"` list of an OAuth 1 header.
fn parse_oauth1_params(params: &str) -> Result<BTreeMap<String, String>, OAuthError> {
    let mut parsed = BTreeMap::new();
    for pair in params.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| OAuthError::invalid_token("Invalid OAuth header parameter."))?;
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        parsed.insert(key.trim().to_string(), value.to_string());
    }
    Ok(parsed)
}
