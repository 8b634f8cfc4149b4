//! Read/write permission check.
//!
//! Decides whether a request's method is allowed given the token it was
//! authenticated with:
//!
//! | Token | Safe method | Unsafe method |
//! |-------|-------------|---------------|
//! | none | deny (401) | deny (401) |
//! | legacy, writable resource | allow | allow |
//! | legacy, read-only resource | allow | deny (403) |
//! | scoped | needs `READ` | needs `WRITE` |
//!
//! The check is a pure function of the token and the method. It reads
//! only fields already present on the token and keeps no state, so one
//! checker can be shared across any number of concurrent requests.

use axum::http::Method;

use super::error::OAuthError;
use super::scope::Scope;
use super::token::Token;
use crate::method::{MethodClass, MethodClassifier, StandardMethods};

/// Checks a token's read/write capability against a request method.
///
/// # Example
///
/// ```rust
/// use axum::http::Method;
/// use tower_rw_scope::oauth::{Scope, ScopePermissionChecker, ScopedToken, Token};
///
/// let checker = ScopePermissionChecker::new();
/// let token: Token = ScopedToken::new("t", Scope::READ).into();
///
/// assert!(checker.has_permission(Some(&token), &Method::GET));
/// assert!(!checker.has_permission(Some(&token), &Method::POST));
/// assert!(!checker.has_permission(None, &Method::GET));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopePermissionChecker<C = StandardMethods> {
    classifier: C,
}

impl ScopePermissionChecker<StandardMethods> {
    /// Create a checker using the standard safe-method set.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: MethodClassifier> ScopePermissionChecker<C> {
    /// Create a checker with a custom method classifier.
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Returns true if the request may proceed.
    ///
    /// Exactly `self.check(token, method).is_ok()`.
    pub fn has_permission(&self, token: Option<&Token>, method: &Method) -> bool {
        self.check(token, method).is_ok()
    }

    /// Check a request, returning the reason for a denial.
    ///
    /// - no token: [`OAuthError::MissingToken`]
    /// - legacy token on a read-only resource with an unsafe method:
    ///   [`OAuthError::ReadOnlyResource`]
    /// - scoped token without the required bit:
    ///   [`OAuthError::InsufficientScope`]
    pub fn check(&self, token: Option<&Token>, method: &Method) -> Result<(), OAuthError> {
        let Some(token) = token else {
            tracing::debug!(method = %method, "denied: no token");
            return Err(OAuthError::MissingToken);
        };

        let class = self.classifier.classify(method);
        let result = check_class(token, class);

        if let Err(error) = &result {
            tracing::debug!(
                method = %method,
                class = %class,
                reason = %error,
                "denied"
            );
        }
        result
    }
}

/// Check a token against a method using the standard safe-method set.
pub fn has_permission(token: Option<&Token>, method: &Method) -> bool {
    ScopePermissionChecker::new().has_permission(token, method)
}

fn check_class(token: &Token, class: MethodClass) -> Result<(), OAuthError> {
    match token {
        Token::Legacy(legacy) => {
            if class.is_safe() || !legacy.resource.is_readonly {
                Ok(())
            } else {
                Err(OAuthError::ReadOnlyResource {
                    resource: legacy.resource.name.clone(),
                })
            }
        }
        Token::Scoped(scoped) => {
            let required = Scope::required_for(class);
            if Scope::check(required, scoped.scope) {
                Ok(())
            } else {
                Err(OAuthError::InsufficientScope {
                    required,
                    granted: scoped.scope,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{LegacyToken, Resource, ScopedToken};

    const SAFE: [Method; 3] = [Method::GET, Method::HEAD, Method::OPTIONS];
    const UNSAFE: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    fn scoped(scope: Scope) -> Token {
        ScopedToken::new("access_token", scope).into()
    }

    fn legacy(readonly: bool) -> Token {
        let resource = Resource {
            name: "photos".to_string(),
            is_readonly: readonly,
        };
        LegacyToken::new("oauth1", resource).into()
    }

    #[test]
    fn test_no_token_is_denied() {
        for method in SAFE.iter().chain(UNSAFE.iter()) {
            assert!(!has_permission(None, method), "{method}");
        }
        assert_eq!(
            ScopePermissionChecker::new().check(None, &Method::GET),
            Err(OAuthError::MissingToken)
        );
    }

    #[test]
    fn test_read_scope_allows_safe_methods() {
        for scope in [Scope::READ, Scope::READ_WRITE] {
            for method in &SAFE {
                assert!(has_permission(Some(&scoped(scope)), method), "{scope} {method}");
            }
        }
    }

    #[test]
    fn test_read_scope_denies_unsafe_methods() {
        let token = scoped(Scope::READ);
        for method in &UNSAFE {
            assert!(!has_permission(Some(&token), method), "{method}");
        }
    }

    #[test]
    fn test_write_scope_allows_unsafe_methods() {
        for scope in [Scope::WRITE, Scope::READ_WRITE] {
            for method in &UNSAFE {
                assert!(has_permission(Some(&scoped(scope)), method), "{scope} {method}");
            }
        }
    }

    #[test]
    fn test_write_only_scope_cannot_read() {
        assert!(!has_permission(Some(&scoped(Scope::WRITE)), &Method::GET));
    }

    #[test]
    fn test_empty_scope_is_denied() {
        let token = scoped(Scope::NONE);
        for method in SAFE.iter().chain(UNSAFE.iter()) {
            assert!(!has_permission(Some(&token), method), "{method}");
        }
    }

    #[test]
    fn test_insufficient_scope_reason() {
        let err = ScopePermissionChecker::new()
            .check(Some(&scoped(Scope::READ)), &Method::POST)
            .unwrap_err();
        assert_eq!(
            err,
            OAuthError::InsufficientScope {
                required: Scope::WRITE,
                granted: Scope::READ,
            }
        );
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_readonly_resource() {
        let token = legacy(true);
        for method in &SAFE {
            assert!(has_permission(Some(&token), method), "{method}");
        }
        for method in &UNSAFE {
            assert!(!has_permission(Some(&token), method), "{method}");
        }
        assert_eq!(
            ScopePermissionChecker::new().check(Some(&token), &Method::DELETE),
            Err(OAuthError::ReadOnlyResource {
                resource: "photos".to_string()
            })
        );
    }

    #[test]
    fn test_writable_resource_allows_everything() {
        let token = legacy(false);
        for method in SAFE.iter().chain(UNSAFE.iter()) {
            assert!(has_permission(Some(&token), method), "{method}");
        }
    }

    #[test]
    fn test_check_does_not_modify_token() {
        let token = scoped(Scope::READ);
        let before = token.clone();
        let _ = has_permission(Some(&token), &Method::POST);
        assert_eq!(token, before);
    }

    #[test]
    fn test_custom_classifier() {
        #[derive(Clone)]
        struct AllUnsafe;

        impl MethodClassifier for AllUnsafe {
            fn classify(&self, _method: &Method) -> MethodClass {
                MethodClass::Unsafe
            }
        }

        let checker = ScopePermissionChecker::with_classifier(AllUnsafe);
        assert!(!checker.has_permission(Some(&scoped(Scope::READ)), &Method::GET));
        assert!(checker.has_permission(Some(&scoped(Scope::WRITE)), &Method::GET));
    }

    #[test]
    fn test_checker_is_shareable_across_threads() {
        let checker = ScopePermissionChecker::new();
        let token = scoped(Scope::READ);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    assert!(checker.has_permission(Some(&token), &Method::GET));
                    assert!(!checker.has_permission(Some(&token), &Method::PUT));
                });
            }
        });
    }
}
