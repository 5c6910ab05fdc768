//! Transition functions: the log viewer state machine.
//!
//! Each function takes the current state by shared reference and returns the next
//! state. Inputs are never mutated. When an action changes nothing, the returned
//! `Arc` is the input `Arc`, so `Arc::ptr_eq` tells consumers they can skip work.
//! Transitions perform no I/O.

use crate::model::{LogLine, LogSection, SectionKey, SectionStatus, StateError};
use crate::state::search::{self, SearchQuery};
use crate::state::{LogAction, LogState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

// ===== Public API =====

/// Apply one action.
///
/// Unknown section keys and duplicate keys fail fast with a [`StateError`].
pub fn reduce(state: &Arc<LogState>, action: LogAction) -> Result<Arc<LogState>, StateError> {
    trace!(action = action.kind(), key = ?action.section_key(), "reduce");

    match action {
        LogAction::CreateSections { keys } => create_sections(state, keys),
        LogAction::FetchingSectionData { key } => fetching_section_data(state, &key),
        LogAction::UpdateSectionData { key, lines } => update_section_data(state, &key, lines),
        LogAction::SectionFailed { key, message } => section_failed(state, &key, message),
        LogAction::ResetSection { key } => reset_section(state, &key),
        LogAction::ToggleSection { key } => toggle_section(state, &key),
        LogAction::Search { text } => search(state, text),
        LogAction::ResetSearch => reset_search(state),
        LogAction::GoToNextSearchResult => go_to_next_search_result(state),
        LogAction::GoToPrevSearchResult => go_to_prev_search_result(state),
    }
}

/// Replace the section list with fresh NotStarted, closed sections.
///
/// The search text survives a new execution; its matches do not.
pub fn create_sections(
    state: &Arc<LogState>,
    keys: Vec<SectionKey>,
) -> Result<Arc<LogState>, StateError> {
    let mut seen = HashSet::with_capacity(keys.len());
    if let Some(duplicate) = keys.iter().find(|key| !seen.insert(*key)) {
        return Err(StateError::DuplicateSection {
            key: duplicate.clone(),
        });
    }

    let already_fresh = state.log_keys() == keys.as_slice()
        && state.sections().all(LogSection::is_pristine)
        && !state.search().has_matches();
    if already_fresh {
        return Ok(Arc::clone(state));
    }

    let data_map: HashMap<SectionKey, Arc<LogSection>> = keys
        .iter()
        .map(|key| (key.clone(), Arc::new(LogSection::new(key.clone()))))
        .collect();
    let search = state.search().without_matches();

    Ok(Arc::new(LogState::from_parts(
        Arc::from(keys),
        data_map,
        search,
    )))
}

/// Mark a section as Loading. A section that is already Loading is left as is.
pub fn fetching_section_data(
    state: &Arc<LogState>,
    key: &SectionKey,
) -> Result<Arc<LogState>, StateError> {
    let section = state.require_section(key)?;
    if section.status() == SectionStatus::Loading {
        return Ok(Arc::clone(state));
    }

    let next = state.with_section(Arc::new(section.to_loading()));
    Ok(Arc::new(drop_section_matches(next, key)))
}

/// Store a fetched line array. The section becomes Loaded and open.
///
/// With an active search the new lines are searched right away and the current
/// match stays on the same logical match.
pub fn update_section_data(
    state: &Arc<LogState>,
    key: &SectionKey,
    lines: Vec<LogLine>,
) -> Result<Arc<LogState>, StateError> {
    let section = state.require_section(key)?;
    let loaded = Arc::new(section.to_loaded(lines));
    let mut next = state.with_section(Arc::clone(&loaded));

    if let Some(query) = SearchQuery::new(state.search().text()) {
        let matches = search::search_section(&loaded, &query, state.search().options());
        let had_current = state.search().current_index().is_some();
        let search = state
            .search()
            .replace_section_matches(state.log_keys(), key, matches);
        next = next.with_search(search);

        if !had_current {
            if let Some(current) = next.search().current_match(next.log_keys()) {
                next = open_section(next, &current.section_key);
            }
        }
    }

    Ok(Arc::new(next))
}

/// Record a fetch failure. Visibility is untouched so the error shows inline.
pub fn section_failed(
    state: &Arc<LogState>,
    key: &SectionKey,
    message: String,
) -> Result<Arc<LogState>, StateError> {
    let section = state.require_section(key)?;
    let next = state.with_section(Arc::new(section.to_failed(message)));
    Ok(Arc::new(drop_section_matches(next, key)))
}

/// Back to NotStarted: data and error cleared, visibility unchanged.
pub fn reset_section(
    state: &Arc<LogState>,
    key: &SectionKey,
) -> Result<Arc<LogState>, StateError> {
    let section = state.require_section(key)?;
    let already_reset = section.status() == SectionStatus::NotStarted
        && section.data().is_empty()
        && section.error_message().is_none();
    if already_reset {
        return Ok(Arc::clone(state));
    }

    let next = state.with_section(Arc::new(section.to_reset()));
    Ok(Arc::new(drop_section_matches(next, key)))
}

/// Flip visibility.
///
/// Fetching on first open is the caller's responsibility (see `FetchOrchestrator`).
pub fn toggle_section(
    state: &Arc<LogState>,
    key: &SectionKey,
) -> Result<Arc<LogState>, StateError> {
    let section = state.require_section(key)?;
    let toggled = section.with_open(!section.is_open());
    Ok(Arc::new(state.with_section(Arc::new(toggled))))
}

/// Recompute all matches over Loaded sections.
///
/// The current index moves to the first match and its section is opened.
/// Empty text clears the search; any other text, whitespace included, is
/// searched as given.
pub fn search(state: &Arc<LogState>, text: String) -> Result<Arc<LogState>, StateError> {
    let Some(query) = SearchQuery::new(text.as_str()) else {
        return reset_search(state);
    };

    let matches = search::execute_search(state, &query);
    let results = state.search().with_results(text, matches);
    let current = results.current_match(state.log_keys());

    let needs_open = current
        .as_ref()
        .and_then(|m| state.section(&m.section_key))
        .is_some_and(|section| !section.is_open());
    if results == *state.search() && !needs_open {
        return Ok(Arc::clone(state));
    }

    let mut next = state.with_search(results);
    if let Some(current) = current {
        next = open_section(next, &current.section_key);
    }
    Ok(Arc::new(next))
}

/// Clear query, matches and current index.
pub fn reset_search(state: &Arc<LogState>) -> Result<Arc<LogState>, StateError> {
    let search = state.search();
    if !search.is_active() && !search.has_matches() && search.current_index().is_none() {
        return Ok(Arc::clone(state));
    }
    Ok(Arc::new(state.with_search(search.cleared())))
}

/// `(current + 1) mod total`; opens the owning section.
pub fn go_to_next_search_result(state: &Arc<LogState>) -> Result<Arc<LogState>, StateError> {
    step_search_result(state, Direction::Forward)
}

/// `(current - 1 + total) mod total`; opens the owning section.
pub fn go_to_prev_search_result(state: &Arc<LogState>) -> Result<Arc<LogState>, StateError> {
    step_search_result(state, Direction::Backward)
}

// ===== Helper Functions =====

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn step_search_result(
    state: &Arc<LogState>,
    direction: Direction,
) -> Result<Arc<LogState>, StateError> {
    let total = state.search().total_matches();
    if total == 0 {
        return Ok(Arc::clone(state));
    }

    let current = state.search().current_index().unwrap_or(0);
    let target = match direction {
        Direction::Forward => (current + 1) % total,
        Direction::Backward => (current + total - 1) % total,
    };

    let mut next = state.with_search(state.search().with_current_index(target));
    if let Some(m) = next.search().current_match(next.log_keys()) {
        next = open_section(next, &m.section_key);
    }
    Ok(Arc::new(next))
}

/// Open a section if it exists and is closed.
fn open_section(state: LogState, key: &SectionKey) -> LogState {
    let opened = match state.section(key) {
        Some(section) if !section.is_open() => Arc::new(section.with_open(true)),
        _ => return state,
    };
    state.with_section(opened)
}

/// Remove one section's matches, keeping the current match anchored.
fn drop_section_matches(state: LogState, key: &SectionKey) -> LogState {
    if state.search().matches_for(key).is_empty() {
        return state;
    }
    let search = state
        .search()
        .replace_section_matches(state.log_keys(), key, Vec::new());
    state.with_search(search)
}

// ===== Tests =====

#[cfg(test)]
#[path = "transitions_tests.rs"]
mod tests;
