//! OAuth 1 / OAuth 2 token authentication with read/write authorization.
//!
//! # Architecture
//!
//! - **Tokens** ([`Token`]): either an OAuth 1 [`LegacyToken`] bound to a
//!   [`Resource`] with a read-only flag, or an OAuth 2 [`ScopedToken`]
//!   carrying a [`Scope`] bitmask.
//!
//! - **Token Resolution** ([`TokenProvider`]): Pluggable trait turning a
//!   request [`Credential`](crate::auth::Credential) into a [`Token`].
//!   [`StaticTokenProvider`] is an in-memory implementation.
//!
//! - **Permission Check** ([`ScopePermissionChecker`]): safe methods need
//!   read access, unsafe methods need write access.
//!
//! - **HTTP Middleware** ([`AuthenticationLayer`], [`ReadWriteScopeLayer`]):
//!   Tower layers that resolve tokens, enforce the check, and answer
//!   401/403 with `WWW-Authenticate`.
//!
//! # Status codes
//!
//! | Situation | Status |
//! |-----------|--------|
//! | no credentials | 401 |
//! | malformed, unknown or expired token | 401 |
//! | scoped token without the required scope | 403 |
//! | legacy token on a read-only resource, unsafe method | 403 |

pub mod error;
pub mod middleware;
pub mod permission;
pub mod scope;
pub mod token;

// Re-exports
pub use error::OAuthError;
pub use middleware::{
    AuthenticationLayer, AuthenticationService, ReadWriteScopeLayer, ReadWriteScopeService,
};
pub use permission::{ScopePermissionChecker, has_permission};
pub use scope::Scope;
pub use token::{LegacyToken, Resource, ScopedToken, StaticTokenProvider, Token, TokenProvider};
