//! The state store: single source of truth for the log viewer.
//!
//! `LogState` is immutable from the outside. New states are produced only by the
//! transition functions in [`crate::state::transitions`]. Sections and the search
//! slice are held behind `Arc`, so a transition shares everything it did not touch
//! with its input and consumers can detect changes with `Arc::ptr_eq`.

use crate::model::{LogSection, SectionKey, StateError};
use crate::state::search::{SearchData, SearchOptions};
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered sections, keyed section map and search state.
///
/// Invariant: every key in `log_keys` has exactly one entry in `data_map`, and
/// vice versa. `log_keys` is the canonical vertical order of the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogState {
    log_keys: Arc<[SectionKey]>,
    data_map: HashMap<SectionKey, Arc<LogSection>>,
    search: Arc<SearchData>,
}

impl LogState {
    /// Empty store with default search options.
    pub fn new() -> Self {
        Self::with_search_options(SearchOptions::default())
    }

    /// Empty store searching with `options`.
    pub fn with_search_options(options: SearchOptions) -> Self {
        Self {
            log_keys: Arc::from(Vec::new()),
            data_map: HashMap::new(),
            search: Arc::new(SearchData::new(options)),
        }
    }

    /// Section keys in display order.
    pub fn log_keys(&self) -> &[SectionKey] {
        &self.log_keys
    }

    /// Shared handle to the key order, for derived views that outlive a borrow.
    pub fn log_keys_arc(&self) -> &Arc<[SectionKey]> {
        &self.log_keys
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.log_keys.len()
    }

    /// Whether there are no sections.
    pub fn is_empty(&self) -> bool {
        self.log_keys.is_empty()
    }

    /// Section for `key`, if it exists.
    pub fn section(&self, key: &SectionKey) -> Option<&LogSection> {
        self.data_map.get(key).map(Arc::as_ref)
    }

    /// Shared handle of a section, for cheap change detection.
    pub fn section_arc(&self, key: &SectionKey) -> Option<&Arc<LogSection>> {
        self.data_map.get(key)
    }

    /// Section lookup that treats an unknown key as a caller bug.
    pub fn require_section(&self, key: &SectionKey) -> Result<&Arc<LogSection>, StateError> {
        self.data_map
            .get(key)
            .ok_or_else(|| StateError::UnknownSection { key: key.clone() })
    }

    /// Sections in viewport order.
    pub fn sections(&self) -> impl Iterator<Item = &LogSection> + '_ {
        self.log_keys
            .iter()
            .filter_map(|key| self.data_map.get(key).map(Arc::as_ref))
    }

    /// Position of `key` in display order.
    pub fn section_index(&self, key: &SectionKey) -> Option<usize> {
        self.log_keys.iter().position(|k| k == key)
    }

    /// Search slice.
    pub fn search(&self) -> &SearchData {
        &self.search
    }

    /// Shared handle of the search slice, for cheap change detection.
    pub fn search_arc(&self) -> &Arc<SearchData> {
        &self.search
    }

    /// Check the key/map invariant.
    pub fn validate(&self) -> Result<(), StateError> {
        for key in self.log_keys.iter() {
            if !self.data_map.contains_key(key) {
                return Err(StateError::Divergence { key: key.clone() });
            }
        }
        if self.data_map.len() != self.log_keys.len() {
            let mut orphans: Vec<&SectionKey> = self
                .data_map
                .keys()
                .filter(|key| !self.log_keys.contains(key))
                .collect();
            orphans.sort();
            if let Some(key) = orphans.first() {
                return Err(StateError::Divergence {
                    key: (*key).clone(),
                });
            }
            // Same size mismatch without orphans means a duplicated key in log_keys.
            let mut seen = std::collections::HashSet::new();
            if let Some(key) = self.log_keys.iter().find(|k| !seen.insert(*k)) {
                return Err(StateError::DuplicateSection { key: key.clone() });
            }
        }
        Ok(())
    }

    // ===== Construction used by transitions =====

    pub(crate) fn from_parts(
        log_keys: Arc<[SectionKey]>,
        data_map: HashMap<SectionKey, Arc<LogSection>>,
        search: SearchData,
    ) -> Self {
        Self {
            log_keys,
            data_map,
            search: Arc::new(search),
        }
    }

    /// Copy with one section replaced; everything else is shared.
    pub(crate) fn with_section(&self, section: Arc<LogSection>) -> Self {
        let mut data_map = self.data_map.clone();
        data_map.insert(section.key().clone(), section);
        Self {
            log_keys: Arc::clone(&self.log_keys),
            data_map,
            search: Arc::clone(&self.search),
        }
    }

    /// Copy with the search slice replaced; sections are shared.
    pub(crate) fn with_search(&self, search: SearchData) -> Self {
        Self {
            log_keys: Arc::clone(&self.log_keys),
            data_map: self.data_map.clone(),
            search: Arc::new(search),
        }
    }
}

impl Default for LogState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> SectionKey {
        SectionKey::new(raw).unwrap()
    }

    fn state_with(keys: &[&str]) -> LogState {
        let keys: Vec<SectionKey> = keys.iter().map(|k| key(k)).collect();
        let data_map = keys
            .iter()
            .map(|k| (k.clone(), Arc::new(LogSection::new(k.clone()))))
            .collect();
        LogState::from_parts(Arc::from(keys), data_map, SearchData::default())
    }

    #[test]
    fn new_state_is_empty_and_valid() {
        let state = LogState::new();
        assert!(state.is_empty());
        assert_eq!(state.validate(), Ok(()));
        assert!(!state.search().is_active());
    }

    #[test]
    fn sections_iterate_in_key_order() {
        let state = state_with(&["c", "a", "b"]);
        let order: Vec<&str> = state.sections().map(|s| s.key().as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn require_section_rejects_unknown_key() {
        let state = state_with(&["build"]);
        assert_eq!(
            state.require_section(&key("deploy")).err(),
            Some(StateError::UnknownSection { key: key("deploy") })
        );
    }

    #[test]
    fn section_index_follows_log_keys() {
        let state = state_with(&["build", "test"]);
        assert_eq!(state.section_index(&key("test")), Some(1));
        assert_eq!(state.section_index(&key("lint")), None);
    }

    #[test]
    fn with_section_shares_untouched_sections() {
        let state = state_with(&["build", "test"]);
        let build = state.section_arc(&key("build")).unwrap().clone();
        let next = state.with_section(Arc::new(build.with_open(true)));

        assert!(Arc::ptr_eq(
            state.section_arc(&key("test")).unwrap(),
            next.section_arc(&key("test")).unwrap()
        ));
        assert!(!Arc::ptr_eq(
            state.section_arc(&key("build")).unwrap(),
            next.section_arc(&key("build")).unwrap()
        ));
        assert!(Arc::ptr_eq(state.search_arc(), next.search_arc()));
    }

    #[test]
    fn validate_detects_missing_map_entry() {
        let keys: Arc<[SectionKey]> = Arc::from(vec![key("build"), key("test")]);
        let mut data_map = HashMap::new();
        data_map.insert(key("build"), Arc::new(LogSection::new(key("build"))));
        let state = LogState::from_parts(keys, data_map, SearchData::default());

        assert_eq!(
            state.validate(),
            Err(StateError::Divergence { key: key("test") })
        );
    }

    #[test]
    fn validate_detects_orphaned_map_entry() {
        let keys: Arc<[SectionKey]> = Arc::from(vec![key("build")]);
        let mut data_map = HashMap::new();
        data_map.insert(key("build"), Arc::new(LogSection::new(key("build"))));
        data_map.insert(key("zombie"), Arc::new(LogSection::new(key("zombie"))));
        let state = LogState::from_parts(keys, data_map, SearchData::default());

        assert_eq!(
            state.validate(),
            Err(StateError::Divergence { key: key("zombie") })
        );
    }
}
