//! Actions accepted by the state machine and the UI events that produce them.

use crate::model::{LogLine, SectionKey};

/// Every state change is one of these.
///
/// Closed set: `transitions::reduce` matches exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum LogAction {
    /// Replace the section list (new execution). Idempotent for the same keys.
    CreateSections {
        /// New section order. Must not repeat a key.
        keys: Vec<SectionKey>,
    },
    /// A fetch for this section was issued.
    FetchingSectionData {
        /// Section being fetched.
        key: SectionKey,
    },
    /// A fetch resolved with the section's complete line array.
    UpdateSectionData {
        /// Section the lines belong to.
        key: SectionKey,
        /// Every line of the section, in order.
        lines: Vec<LogLine>,
    },
    /// A fetch failed; `message` is shown in place of the lines.
    SectionFailed {
        /// Section whose fetch failed.
        key: SectionKey,
        /// Provider error text.
        message: String,
    },
    /// Back to NotStarted (retry after error, upstream re-run).
    ResetSection {
        /// Section to reset.
        key: SectionKey,
    },
    /// Flip visibility.
    ToggleSection {
        /// Section to show or hide.
        key: SectionKey,
    },
    /// Run a full-text search; empty text clears the search.
    Search {
        /// Query as typed.
        text: String,
    },
    /// Clear query, matches and current index.
    ResetSearch,
    /// Move to the next match, wrapping to the first.
    GoToNextSearchResult,
    /// Move to the previous match, wrapping to the last.
    GoToPrevSearchResult,
}

impl LogAction {
    /// Short name for tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            LogAction::CreateSections { .. } => "create_sections",
            LogAction::FetchingSectionData { .. } => "fetching_section_data",
            LogAction::UpdateSectionData { .. } => "update_section_data",
            LogAction::SectionFailed { .. } => "section_failed",
            LogAction::ResetSection { .. } => "reset_section",
            LogAction::ToggleSection { .. } => "toggle_section",
            LogAction::Search { .. } => "search",
            LogAction::ResetSearch => "reset_search",
            LogAction::GoToNextSearchResult => "next_search_result",
            LogAction::GoToPrevSearchResult => "prev_search_result",
        }
    }

    /// Section this action targets, if any.
    pub fn section_key(&self) -> Option<&SectionKey> {
        match self {
            LogAction::FetchingSectionData { key }
            | LogAction::UpdateSectionData { key, .. }
            | LogAction::SectionFailed { key, .. }
            | LogAction::ResetSection { key }
            | LogAction::ToggleSection { key } => Some(key),
            LogAction::CreateSections { .. }
            | LogAction::Search { .. }
            | LogAction::ResetSearch
            | LogAction::GoToNextSearchResult
            | LogAction::GoToPrevSearchResult => None,
        }
    }
}

/// Events emitted by the rendering side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Header of this section was activated.
    SectionClick(SectionKey),
    /// Jump to the next match.
    SearchNext,
    /// Jump to the previous match.
    SearchPrev,
    /// The search box text changed.
    SearchTextChange(String),
}

impl From<UiEvent> for LogAction {
    /// 1:1 translation. A section click becomes a plain toggle here; fetching on
    /// first open is the orchestrator's job.
    fn from(event: UiEvent) -> Self {
        match event {
            UiEvent::SectionClick(key) => LogAction::ToggleSection { key },
            UiEvent::SearchNext => LogAction::GoToNextSearchResult,
            UiEvent::SearchPrev => LogAction::GoToPrevSearchResult,
            UiEvent::SearchTextChange(text) => LogAction::Search { text },
        }
    }
}
