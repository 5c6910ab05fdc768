//! LogSection - one collapsible, independently fetched bucket of log lines.

use super::{LogLine, SectionKey};
use std::sync::Arc;

/// Fetch lifecycle of a section.
///
/// NotStarted → Loading → {Loaded | Error}; a reset returns to NotStarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SectionStatus {
    /// Never fetched, or reset since.
    #[default]
    NotStarted,
    /// A fetch is outstanding.
    Loading,
    /// Lines are present.
    Loaded,
    /// The last fetch failed.
    Error,
}

/// One logical unit of work and its log lines.
///
/// Invariants:
/// - `data` is non-empty only when `status == Loaded`
/// - `error_message` is set only when `status == Error`
///
/// `is_open` is display state and independent of `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSection {
    key: SectionKey,
    status: SectionStatus,
    is_open: bool,
    data: Arc<[LogLine]>,
    error_message: Option<String>,
}

impl LogSection {
    /// Fresh NotStarted, closed section.
    pub fn new(key: SectionKey) -> Self {
        Self {
            key,
            status: SectionStatus::NotStarted,
            is_open: false,
            data: Arc::from(Vec::new()),
            error_message: None,
        }
    }

    /// Unit this section shows.
    pub fn key(&self) -> &SectionKey {
        &self.key
    }

    /// Fetch lifecycle position.
    pub fn status(&self) -> SectionStatus {
        self.status
    }

    /// Whether line rows are shown.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Lines of a Loaded section; empty otherwise.
    pub fn data(&self) -> &[LogLine] {
        &self.data
    }

    /// Line at `index`, if loaded.
    pub fn line(&self, index: usize) -> Option<&LogLine> {
        self.data.get(index)
    }

    /// Provider message of a failed fetch.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether `status` is Loaded.
    pub fn is_loaded(&self) -> bool {
        self.status == SectionStatus::Loaded
    }

    /// True for a section created by `CreateSections` and never touched since.
    pub fn is_pristine(&self) -> bool {
        self.status == SectionStatus::NotStarted
            && !self.is_open
            && self.data.is_empty()
            && self.error_message.is_none()
    }

    /// Open while no data can exist yet: render a loading placeholder,
    /// not an empty open section.
    pub fn shows_loading(&self) -> bool {
        self.is_open
            && matches!(
                self.status,
                SectionStatus::NotStarted | SectionStatus::Loading
            )
    }

    /// Number of line rows this section contributes to the viewport.
    pub fn visible_line_count(&self) -> usize {
        if self.is_open && self.status == SectionStatus::Loaded {
            self.data.len()
        } else {
            0
        }
    }

    // ===== Transitions (crate-internal, used by the state machine) =====

    pub(crate) fn with_open(&self, is_open: bool) -> Self {
        Self {
            is_open,
            ..self.clone()
        }
    }

    pub(crate) fn to_loading(&self) -> Self {
        Self {
            status: SectionStatus::Loading,
            data: Arc::from(Vec::new()),
            error_message: None,
            ..self.clone()
        }
    }

    pub(crate) fn to_loaded(&self, lines: Vec<LogLine>) -> Self {
        Self {
            status: SectionStatus::Loaded,
            is_open: true,
            data: Arc::from(lines),
            error_message: None,
            key: self.key.clone(),
        }
    }

    pub(crate) fn to_failed(&self, message: String) -> Self {
        Self {
            status: SectionStatus::Error,
            data: Arc::from(Vec::new()),
            error_message: Some(message),
            ..self.clone()
        }
    }

    pub(crate) fn to_reset(&self) -> Self {
        Self {
            status: SectionStatus::NotStarted,
            data: Arc::from(Vec::new()),
            error_message: None,
            ..self.clone()
        }
    }
}
