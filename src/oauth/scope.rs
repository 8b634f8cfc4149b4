//! Read/write scope bitmask.
//!
//! [`Scope`] is the capability set an OAuth 2 token was granted. READ and
//! WRITE are independent bits: a token granted only WRITE may mutate but
//! may not read. Use [`Scope::check`] to test a requirement against a grant.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::method::MethodClass;

/// A set of granted (or required) capabilities.
///
/// # Example
///
/// ```rust
/// use tower_rw_scope::oauth::Scope;
///
/// let granted: Scope = "read+write".parse().unwrap();
/// assert!(Scope::check(Scope::WRITE, granted));
/// assert!(!Scope::check(Scope::WRITE, Scope::READ));
/// ```
///
/// The string form (`Display`, `FromStr`, serde) only knows `read` and
/// `write`. Bits outside [`Scope::READ_WRITE`] survive the bit operations
/// but are dropped when a scope is written out as names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(u32);

const NAMES: [(&str, Scope); 2] = [("read", Scope::READ), ("write", Scope::WRITE)];

impl Scope {
    /// No capabilities.
    pub const NONE: Scope = Scope(0);
    /// Read access, required by safe methods.
    pub const READ: Scope = Scope(1 << 1);
    /// Write access, required by unsafe methods.
    pub const WRITE: Scope = Scope(1 << 2);
    /// Both read and write access.
    pub const READ_WRITE: Scope = Scope(Self::READ.0 | Self::WRITE.0);

    /// Build a scope from raw provider bits.
    ///
    /// Unknown bits are kept in the value and ignored by [`Scope::check`],
    /// but they have no name and do not appear in the string form.
    pub const fn from_bits(bits: u32) -> Self {
        Scope(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Scope) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if `granted` satisfies `required`.
    ///
    /// All bits of `required` must be present in `granted`. An empty
    /// requirement is never satisfied.
    pub const fn check(required: Scope, granted: Scope) -> bool {
        !required.is_empty() && granted.contains(required)
    }

    /// The scope a request with the given method class needs.
    pub const fn required_for(class: MethodClass) -> Scope {
        match class {
            MethodClass::Safe => Scope::READ,
            MethodClass::Unsafe => Scope::WRITE,
        }
    }

    /// Names of the known capabilities set in this scope.
    pub fn names(self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(_, scope)| self.contains(*scope))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for Scope {
    type Output = Scope;

    fn bitor(self, rhs: Scope) -> Scope {
        Scope(self.0 | rhs.0)
    }
}

impl BitOrAssign for Scope {
    fn bitor_assign(&mut self, rhs: Scope) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Scope {
    type Output = Scope;

    fn bitand(self, rhs: Scope) -> Scope {
        Scope(self.0 & rhs.0)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", names.join("+"))
    }
}

/// Parses `read`, `write`, `read+write`, or names separated by whitespace.
/// Matching is case-insensitive.
impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scope = Scope::NONE;
        for part in s.split(|c: char| c == '+' || c.is_whitespace()) {
            if part.is_empty() {
                continue;
            }
            if part.eq_ignore_ascii_case("none") {
                continue;
            }
            let (_, bit) = NAMES
                .iter()
                .find(|(name, _)| part.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::invalid_scope(part))?;
            scope |= *bit;
        }
        Ok(scope)
    }
}

impl TryFrom<String> for Scope {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_bits() {
        assert_eq!(Scope::READ.bits(), 2);
        assert_eq!(Scope::WRITE.bits(), 4);
        assert_eq!(Scope::READ_WRITE.bits(), 6);
        assert_eq!(Scope::READ | Scope::WRITE, Scope::READ_WRITE);
    }

    #[test]
    fn test_check_requires_all_bits() {
        assert!(Scope::check(Scope::READ, Scope::READ));
        assert!(Scope::check(Scope::READ, Scope::READ_WRITE));
        assert!(Scope::check(Scope::WRITE, Scope::READ_WRITE));
        assert!(Scope::check(Scope::READ_WRITE, Scope::READ_WRITE));

        assert!(!Scope::check(Scope::WRITE, Scope::READ));
        assert!(!Scope::check(Scope::READ_WRITE, Scope::READ));
        assert!(!Scope::check(Scope::READ, Scope::NONE));
    }

    #[test]
    fn test_check_write_does_not_imply_read() {
        assert!(Scope::check(Scope::WRITE, Scope::WRITE));
        assert!(!Scope::check(Scope::READ, Scope::WRITE));
    }

    #[test]
    fn test_check_empty_requirement_is_never_satisfied() {
        assert!(!Scope::check(Scope::NONE, Scope::READ_WRITE));
        assert!(!Scope::check(Scope::NONE, Scope::NONE));
    }

    #[test]
    fn test_check_ignores_unknown_granted_bits() {
        let granted = Scope::from_bits(Scope::READ.bits() | 1 << 7);
        assert!(Scope::check(Scope::READ, granted));
        assert!(!Scope::check(Scope::WRITE, granted));
    }

    #[test]
    fn test_required_for() {
        assert_eq!(Scope::required_for(MethodClass::Safe), Scope::READ);
        assert_eq!(Scope::required_for(MethodClass::Unsafe), Scope::WRITE);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("read".parse::<Scope>().unwrap(), Scope::READ);
        assert_eq!("write".parse::<Scope>().unwrap(), Scope::WRITE);
        assert_eq!("read+write".parse::<Scope>().unwrap(), Scope::READ_WRITE);
        assert_eq!("WRITE read".parse::<Scope>().unwrap(), Scope::READ_WRITE);
        assert_eq!("".parse::<Scope>().unwrap(), Scope::NONE);
        assert_eq!("none".parse::<Scope>().unwrap(), Scope::NONE);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "read+admin".parse::<Scope>().unwrap_err();
        assert!(matches!(err, Error::InvalidScope(name) if name == "admin"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Scope::READ.to_string(), "read");
        assert_eq!(Scope::WRITE.to_string(), "write");
        assert_eq!(Scope::READ_WRITE.to_string(), "read+write");
        assert_eq!(Scope::NONE.to_string(), "none");
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Scope::READ_WRITE).unwrap();
        assert_eq!(json, "\"read+write\"");

        let scope: Scope = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(scope, Scope::WRITE);

        assert!(serde_json::from_str::<Scope>("\"delete\"").is_err());
    }

    #[test]
    fn test_string_form_drops_unknown_bits() {
        let scope = Scope::from_bits(Scope::READ.bits() | 1 << 7);
        assert_eq!(scope.bits(), Scope::READ.bits() | 1 << 7);
        assert_eq!(serde_json::to_string(&scope).unwrap(), "\"read\"");

        let unnamed = Scope::from_bits(1 << 7);
        assert!(!unnamed.is_empty());
        assert_eq!(unnamed.to_string(), "none");
        let back: Scope = serde_json::from_str(&serde_json::to_string(&unnamed).unwrap()).unwrap();
        assert_eq!(back, Scope::NONE);
    }
}
