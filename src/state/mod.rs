//! Log viewer state machine (pure).
//!
//! All state transitions are pure functions testable without a runtime or TUI.

pub mod action;
pub mod search;
pub mod store;
pub mod transitions;

// Re-export for convenience
pub use action::{LogAction, UiEvent};
pub use search::{
    highlight_line, highlight_spans, FieldHighlights, HighlightSpan, LineMatches, MatchSpan,
    SearchData, SearchMatch, SearchOptions, SearchQuery,
};
pub use store::LogState;
pub use transitions::reduce;
