//! Tower middleware for token authentication and read/write authorization.
//!
//! Two layers, applied in this order (outermost first):
//!
//! 1. [`AuthenticationLayer`] resolves the request credential to a
//!    [`Token`] via a [`TokenProvider`] and stores it in request extensions.
//!    Broken or unknown credentials are rejected with 401; requests without
//!    a credential pass through untouched.
//! 2. [`ReadWriteScopeLayer`] runs the [`ScopePermissionChecker`] against
//!    the stored token and the request method. No token gives 401, a token
//!    that may not perform the method gives 403.
//!
//! ```rust
//! use tower::ServiceBuilder;
//! use tower_rw_scope::oauth::{
//!     AuthenticationLayer, ReadWriteScopeLayer, Scope, ScopedToken, StaticTokenProvider,
//! };
//!
//! let provider = StaticTokenProvider::new()
//!     .token(ScopedToken::new("reader", Scope::READ));
//!
//! let layers = ServiceBuilder::new()
//!     .layer(AuthenticationLayer::new(provider))
//!     .layer(ReadWriteScopeLayer::new());
//! # let _ = layers;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use super::error::OAuthError;
use super::permission::ScopePermissionChecker;
use super::token::{Token, TokenProvider};
use crate::auth::{
    Credential, extract_credential, extract_form_token, extract_query_token, header_scheme,
    is_form_request,
};
use crate::config::OAuthConfig;
use crate::method::{MethodClassifier, StandardMethods};

/// Tower layer that authenticates requests with a [`TokenProvider`].
#[derive(Clone)]
pub struct AuthenticationLayer<P: TokenProvider> {
    provider: P,
    config: OAuthConfig,
}

impl<P: TokenProvider> AuthenticationLayer<P> {
    /// Create a new layer with the default [`OAuthConfig`].
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: OAuthConfig::default(),
        }
    }

    pub fn config(mut self, config: OAuthConfig) -> Self {
        self.config = config;
        self
    }
}

impl<S, P: TokenProvider> Layer<S> for AuthenticationLayer<P> {
    type Service = AuthenticationService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService {
            inner,
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower service that resolves request credentials to tokens.
///
/// Created by [`AuthenticationLayer`]. For each request:
///
/// 1. Parses the configured header (`Authorization` by default)
/// 2. Falls back to an `access_token` form field, then to `?access_token=`,
///    each as enabled in [`OAuthConfig`]
/// 3. Resolves the credential via the [`TokenProvider`]
/// 4. On success inserts the [`Token`] into request extensions
/// 5. On failure returns 401 with `WWW-Authenticate`
#[derive(Clone)]
pub struct AuthenticationService<S, P: TokenProvider> {
    inner: S,
    provider: P,
    config: OAuthConfig,
}

impl<S, P> tower_service::Service<Request<Body>> for AuthenticationService<S, P>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<crate::BoxError> + Send,
    P: TokenProvider,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let provider = self.provider.clone();
        let config = self.config.clone();
        // Drive the clone that poll_ready prepared, leave a fresh one behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut req, credential) = match read_credential(req, &config).await {
                Ok(found) => found,
                Err(rejection) => return Ok(rejection),
            };
            let Some(credential) = credential else {
                return inner.call(req).await;
            };

            match provider.resolve(&credential).await {
                Ok(token) => {
                    tracing::debug!(scheme = credential.scheme(), "token resolved");
                    req.extensions_mut().insert(token);
                    inner.call(req).await
                }
                Err(error) => {
                    tracing::warn!(
                        scheme = credential.scheme(),
                        error = %error,
                        "credentials rejected"
                    );
                    Ok(oauth_error_response(
                        &error,
                        &config.realm,
                        credential.scheme(),
                    ))
                }
            }
        })
    }
}

/// Find the request credential: header first, then form body, then query.
///
/// The request is handed back because reading a form body consumes it.
/// `Err` carries the response to send instead of calling the inner service.
async fn read_credential(
    req: Request<Body>,
    config: &OAuthConfig,
) -> Result<(Request<Body>, Option<Credential>), Response> {
    let header = req
        .headers()
        .get(config.header_name.as_str())
        .and_then(|v| v.to_str().ok());

    if let Some(header) = header {
        match extract_credential(header) {
            Ok(Some(credential)) => return Ok((req, Some(credential))),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(error = %error, "malformed credentials");
                let scheme = header_scheme(header);
                return Err(oauth_error_response(&error, &config.realm, scheme));
            }
        }
    }

    let mut req = req;
    if config.allow_form_body_token && is_form_request(&req) && !exceeds_limit(&req, config) {
        let (rebuilt, credential) = extract_form_token(req, config.max_form_body_bytes)
            .await
            .map_err(|error| {
                tracing::warn!(error = %error, "failed to read form body");
                detail_response(StatusCode::BAD_REQUEST, "Failed to read request body")
            })?;
        if credential.is_some() {
            return Ok((rebuilt, credential));
        }
        req = rebuilt;
    }

    if config.allow_query_params_token {
        let credential = extract_query_token(req.uri());
        return Ok((req, credential));
    }
    Ok((req, None))
}

/// A declared body larger than the limit is left unread for the handler.
fn exceeds_limit(req: &Request<Body>, config: &OAuthConfig) -> bool {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > config.max_form_body_bytes)
}

/// Tower layer that enforces read/write permission on authenticated requests.
#[derive(Clone, Default)]
pub struct ReadWriteScopeLayer<C = StandardMethods> {
    checker: ScopePermissionChecker<C>,
    config: OAuthConfig,
}

impl ReadWriteScopeLayer<StandardMethods> {
    /// Create a layer using the standard safe-method set.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: MethodClassifier> ReadWriteScopeLayer<C> {
    /// Create a layer around a custom checker.
    pub fn with_checker(checker: ScopePermissionChecker<C>) -> Self {
        Self {
            checker,
            config: OAuthConfig::default(),
        }
    }

    /// Use the same [`OAuthConfig`] as the [`AuthenticationLayer`], so
    /// both layers challenge with one realm.
    pub fn config(mut self, config: OAuthConfig) -> Self {
        self.config = config;
        self
    }
}

impl<S, C: MethodClassifier> Layer<S> for ReadWriteScopeLayer<C> {
    type Service = ReadWriteScopeService<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        ReadWriteScopeService {
            inner,
            checker: self.checker.clone(),
            realm: self.config.realm.clone(),
        }
    }
}

/// Tower service that denies requests whose token may not use the
/// request method.
///
/// Created by [`ReadWriteScopeLayer`]. Expects [`AuthenticationLayer`] (or
/// anything else inserting a [`Token`] extension) to run first.
#[derive(Clone)]
pub struct ReadWriteScopeService<S, C = StandardMethods> {
    inner: S,
    checker: ScopePermissionChecker<C>,
    realm: String,
}

impl<S, C> tower_service::Service<Request<Body>> for ReadWriteScopeService<S, C>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<crate::BoxError> + Send,
    C: MethodClassifier,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let token = req.extensions().get::<Token>();

        if let Err(error) = self.checker.check(token, req.method()) {
            let response = oauth_error_response(&error, &self.realm, error.scheme());
            return Box::pin(async move { Ok(response) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

/// Build an HTTP error response for an OAuth error.
///
/// Returns 401 or 403 with a `WWW-Authenticate` challenge in `scheme` and
/// a JSON body of the form `{"detail": "..."}`.
fn oauth_error_response(error: &OAuthError, realm: &str, scheme: &'static str) -> Response {
    let status = if error.is_forbidden() {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::UNAUTHORIZED
    };

    let www_authenticate = HeaderValue::from_str(&error.challenge(scheme, realm))
        .unwrap_or_else(|_| HeaderValue::from_static(scheme));

    let mut response = detail_response(status, &error.to_string());
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, www_authenticate);
    response
}

fn detail_response(status: StatusCode, detail: &str) -> Response {
    let body = serde_json::json!({ "detail": detail });
    (status, axum::Json(body)).into_response()
}
