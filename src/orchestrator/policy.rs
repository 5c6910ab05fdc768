//! Which sections are fetched as soon as a new execution's sections exist.

use serde::Deserialize;
use std::fmt;

/// Which sections are fetched and opened right after `CreateSections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AutoOpen {
    /// Everything starts closed.
    None,
    /// Only the first unit.
    First,
    /// The last unit is usually the one still running or the one that failed.
    #[default]
    Last,
    /// Every unit.
    All,
}

impl AutoOpen {
    /// Parse a policy name (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(AutoOpen::None),
            "first" => Some(AutoOpen::First),
            "last" => Some(AutoOpen::Last),
            "all" => Some(AutoOpen::All),
            _ => None,
        }
    }

    /// Name accepted by [`AutoOpen::parse`].
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoOpen::None => "none",
            AutoOpen::First => "first",
            AutoOpen::Last => "last",
            AutoOpen::All => "all",
        }
    }

    /// Positions in a list of `len` sections this policy opens.
    pub fn select(&self, len: usize) -> Vec<usize> {
        match (self, len) {
            (_, 0) | (AutoOpen::None, _) => Vec::new(),
            (AutoOpen::First, _) => vec![0],
            (AutoOpen::Last, n) => vec![n - 1],
            (AutoOpen::All, n) => (0..n).collect(),
        }
    }
}

impl fmt::Display for AutoOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(AutoOpen::parse("LAST"), Some(AutoOpen::Last));
        assert_eq!(AutoOpen::parse(" all "), Some(AutoOpen::All));
        assert_eq!(AutoOpen::parse("sometimes"), None);
    }

    #[test]
    fn select_picks_positions() {
        assert_eq!(AutoOpen::None.select(3), Vec::<usize>::new());
        assert_eq!(AutoOpen::First.select(3), vec![0]);
        assert_eq!(AutoOpen::Last.select(3), vec![2]);
        assert_eq!(AutoOpen::All.select(3), vec![0, 1, 2]);
    }

    #[test]
    fn select_on_empty_list_opens_nothing() {
        assert!(AutoOpen::Last.select(0).is_empty());
        assert!(AutoOpen::All.select(0).is_empty());
    }

    #[test]
    fn default_is_last() {
        assert_eq!(AutoOpen::default(), AutoOpen::Last);
    }

    #[test]
    fn deserializes_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            auto_open: AutoOpen,
        }
        let parsed: Wrapper = toml::from_str("auto_open = \"first\"").unwrap();
        assert_eq!(parsed.auto_open, AutoOpen::First);
    }
}
