//! Core identifier newtypes with smart constructors.
//!
//! Section keys validate non-empty strings at construction time.
//! The raw constructor is never exported - use the smart constructor only.

use std::fmt;

/// Stable identifier of one log section (one execution unit, e.g. a pipeline step).
/// NEVER export the constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey(String);

impl SectionKey {
    /// Smart constructor: validates non-empty key.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSectionKey> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidSectionKey::Empty);
        }
        Ok(Self(raw))
    }

    /// The key as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SectionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ===== Error Types =====

/// Why a raw string is not a valid [`SectionKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSectionKey {
    /// The key was the empty string.
    #[error("Section key cannot be empty")]
    Empty,
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_key_accepts_step_name() {
        let key = SectionKey::new("build");
        assert!(key.is_ok(), "Step name should be accepted");
    }

    #[test]
    fn section_key_accepts_whitespace_name() {
        // Unit names come from the pipeline definition verbatim.
        assert!(SectionKey::new(" ").is_ok());
    }

    #[test]
    fn section_key_rejects_empty_string() {
        assert_eq!(SectionKey::new(""), Err(InvalidSectionKey::Empty));
    }

    #[test]
    fn section_key_as_str_returns_original() {
        let key = SectionKey::new("stage/deploy").expect("valid key");
        assert_eq!(key.as_str(), "stage/deploy");
    }

    #[test]
    fn section_key_display_matches_as_str() {
        let key = SectionKey::new("test").expect("valid key");
        assert_eq!(key.to_string(), "test");
    }

    #[test]
    fn section_keys_order_lexicographically() {
        let a = SectionKey::new("a").unwrap();
        let b = SectionKey::new("b").unwrap();
        assert!(a < b);
    }
}
