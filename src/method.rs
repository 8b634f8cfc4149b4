//! HTTP method classification.
//!
//! A request is either *safe* (must not mutate server state) or *unsafe*.
//! Read access is enough for safe methods; everything else needs write
//! access.

use std::fmt;

use axum::http::Method;

/// Whether an HTTP method is read-only or mutating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodClass {
    /// GET, HEAD, OPTIONS
    Safe,
    /// Anything that may change server state
    Unsafe,
}

impl MethodClass {
    pub fn is_safe(self) -> bool {
        matches!(self, MethodClass::Safe)
    }
}

impl fmt::Display for MethodClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodClass::Safe => write!(f, "safe"),
            MethodClass::Unsafe => write!(f, "unsafe"),
        }
    }
}

/// Trait for deciding which HTTP methods count as safe.
///
/// The default [`StandardMethods`] uses the fixed set `{GET, HEAD, OPTIONS}`.
/// Implement this to plug in a different policy, e.g. in tests.
///
/// # Example
///
/// ```rust
/// use axum::http::Method;
/// use tower_rw_scope::method::{MethodClass, MethodClassifier};
///
/// /// Treats every method as mutating.
/// #[derive(Clone)]
/// struct Paranoid;
///
/// impl MethodClassifier for Paranoid {
///     fn classify(&self, _method: &Method) -> MethodClass {
///         MethodClass::Unsafe
///     }
/// }
///
/// assert_eq!(Paranoid.classify(&Method::GET), MethodClass::Unsafe);
/// ```
pub trait MethodClassifier: Clone + Send + Sync + 'static {
    /// Classify a method as safe or unsafe.
    fn classify(&self, method: &Method) -> MethodClass;
}

/// The standard safe-method set: GET, HEAD and OPTIONS.
///
/// Every other method, including TRACE, CONNECT and extension methods,
/// is unsafe.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMethods;

impl StandardMethods {
    pub const SAFE: [Method; 3] = [Method::GET, Method::HEAD, Method::OPTIONS];
}

impl MethodClassifier for StandardMethods {
    fn classify(&self, method: &Method) -> MethodClass {
        if Self::SAFE.contains(method) {
            MethodClass::Safe
        } else {
            MethodClass::Unsafe
        }
    }
}
