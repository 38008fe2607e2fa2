//! Normalized user addresses and conversation pair keys.
//!
//! The remote store forbids `.` in path segments, so addresses are
//! normalized once at the edge (lowercase, `.` replaced by `_`) and carried
//! in normalized form everywhere else.

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// A user address in normalized form: lowercase, `.` replaced by `_`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Normalize and validate a raw address as typed by the user.
    pub fn parse(raw: &str) -> Result<Self, SharedError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SharedError::InvalidAddress("empty address".into()));
        }
        Ok(Self(trimmed.to_lowercase().replace('.', "_")))
    }

    /// Wrap a string that is already in normalized form (e.g. read back
    /// from the store). No validation beyond non-emptiness.
    pub fn from_normalized(s: &str) -> Result<Self, SharedError> {
        if s.is_empty() {
            return Err(SharedError::InvalidAddress("empty address".into()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order-independent identifier for a two-party conversation.
///
/// `PairKey::new(a, b) == PairKey::new(b, a)` for all address pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(a: &Address, b: &Address) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}_{}", lo.as_str(), hi.as_str()))
    }

    pub fn from_raw(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_dots() {
        let addr = Address::parse("Ana.Lopez@Mail.com").unwrap();
        assert_eq!(addr.as_str(), "ana_lopez@mail_com");
    }

    #[test]
    fn rejects_empty() {
        assert!(Address::parse("   ").is_err());
        assert!(Address::from_normalized("").is_err());
    }

    #[test]
    fn pair_key_is_symmetric() {
        let a = Address::parse("ana@mail.com").unwrap();
        let b = Address::parse("Bo@Mail.com").unwrap();
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
    }

    #[test]
    fn pair_key_symmetric_regardless_of_input_case() {
        let a1 = Address::parse("ANA@mail.com").unwrap();
        let a2 = Address::parse("ana@MAIL.com").unwrap();
        let b = Address::parse("bo@mail.com").unwrap();
        assert_eq!(PairKey::new(&a1, &b), PairKey::new(&b, &a2));
    }
}
