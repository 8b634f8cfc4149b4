//! # tower-rw-scope
//!
//! Tower middleware that authenticates requests carrying OAuth 1 or OAuth 2
//! tokens and authorizes them against a read/write scope.
//!
//! The rule is small: safe methods (GET, HEAD, OPTIONS) need read access,
//! everything else needs write access, and a request without a token is
//! always denied. OAuth 2 tokens express access as a [`Scope`](oauth::Scope)
//! bitmask; OAuth 1 tokens are bound to a [`Resource`](oauth::Resource)
//! that is either read-only or writable.
//!
//! Issuing, refreshing and storing tokens is the job of an OAuth provider.
//! This crate only asks it to resolve a credential via
//! [`TokenProvider`](oauth::TokenProvider).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use tower::ServiceBuilder;
//! use tower_rw_scope::BoxError;
//! use tower_rw_scope::oauth::{
//!     AuthenticationLayer, ReadWriteScopeLayer, Scope, ScopedToken, StaticTokenProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let provider = StaticTokenProvider::new()
//!         .token(ScopedToken::new("reader", Scope::READ))
//!         .token(ScopedToken::new("writer", Scope::READ_WRITE));
//!
//!     let app = Router::new()
//!         .route("/notes", get(|| async { "notes" }).post(|| async { "created" }))
//!         .layer(
//!             ServiceBuilder::new()
//!                 .layer(AuthenticationLayer::new(provider))
//!                 .layer(ReadWriteScopeLayer::new()),
//!         );
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Using the check directly
//!
//! ```rust
//! use axum::http::Method;
//! use tower_rw_scope::oauth::{LegacyToken, Resource, Token, has_permission};
//!
//! let token: Token = LegacyToken::new("key", Resource::new("photos").read_only()).into();
//!
//! assert!(has_permission(Some(&token), &Method::GET));
//! assert!(!has_permission(Some(&token), &Method::DELETE));
//! assert!(!has_permission(None, &Method::GET));
//! ```
//!
//! ## Key Types
//!
//! - [`ScopePermissionChecker`](oauth::ScopePermissionChecker) - The read/write decision
//! - [`Token`](oauth::Token) - Resolved OAuth 1 or OAuth 2 token
//! - [`TokenProvider`](oauth::TokenProvider) - Credential to token resolution
//! - [`AuthenticationLayer`](oauth::AuthenticationLayer) - Resolves tokens per request
//! - [`ReadWriteScopeLayer`](oauth::ReadWriteScopeLayer) - Enforces the decision
//! - [`OAuthConfig`](config::OAuthConfig) - Realm, header and token-transport settings

pub mod auth;
pub mod config;
pub mod error;
pub mod method;
pub mod oauth;

// Re-exports
pub use config::OAuthConfig;
pub use error::{BoxError, Error, Result};
pub use method::{MethodClass, MethodClassifier, StandardMethods};
