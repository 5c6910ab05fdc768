//! Index projector: flat row layout of the grouped, virtualized viewport.
//!
//! Every section occupies one header row followed by its visible line rows.
//! A section contributes line rows only while it is open and Loaded; a closed,
//! loading or failed section is just its header. The projection is pure index
//! math over a [`LogState`] and knows nothing about how rows are painted.

use crate::model::SectionKey;
use crate::state::LogState;
use crate::view_state::row_index::RowIndex;
use std::sync::Arc;

/// One row of the flat index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    /// Group header of the section at this position in `log_keys`.
    Header {
        /// Position of the section in `log_keys`.
        section: usize,
    },
    /// Line `line` of the section at position `section`.
    Line {
        /// Position of the section in `log_keys`.
        section: usize,
        /// Index into the section's lines.
        line: usize,
    },
}

impl Row {
    /// Position in `log_keys` of the section this row belongs to.
    pub fn section(&self) -> usize {
        match self {
            Row::Header { section } | Row::Line { section, .. } => *section,
        }
    }
}

/// Row layout derived from one state.
///
/// Rebuilt from scratch for every new state; cheap compared to rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowProjection {
    keys: Arc<[SectionKey]>,
    group_counts: Vec<usize>,
    /// Visible line rows per section.
    lines: RowIndex,
    /// Header plus visible line rows per section.
    rows: RowIndex,
}

impl RowProjection {
    /// Lay out the rows of `state`.
    pub fn project(state: &LogState) -> Self {
        let group_counts: Vec<usize> = state
            .log_keys()
            .iter()
            .map(|key| {
                state
                    .section(key)
                    .map(|section| section.visible_line_count())
                    .unwrap_or(0)
            })
            .collect();
        let with_headers: Vec<usize> = group_counts.iter().map(|count| count + 1).collect();

        Self {
            keys: Arc::clone(state.log_keys_arc()),
            lines: RowIndex::from_counts(&group_counts),
            rows: RowIndex::from_counts(&with_headers),
            group_counts,
        }
    }

    /// Visible line rows per section, in `log_keys` order.
    pub fn group_counts(&self) -> &[usize] {
        &self.group_counts
    }

    /// Number of line rows across all sections (headers excluded).
    pub fn total_rows(&self) -> usize {
        self.lines.total()
    }

    /// Size of the flat index space: every header plus every line row.
    pub fn flat_len(&self) -> usize {
        self.rows.total()
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.group_counts.len()
    }

    /// Key of the section at `section`.
    pub fn section_key(&self, section: usize) -> Option<&SectionKey> {
        self.keys.get(section)
    }

    /// Position of `key` in `log_keys`.
    pub fn section_position(&self, key: &SectionKey) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Row at a flat index; `None` past the end.
    pub fn locate(&self, flat_index: usize) -> Option<Row> {
        let section = self.rows.lower_bound(flat_index)?;
        let offset = flat_index - self.rows.start(section);
        Some(match offset {
            0 => Row::Header { section },
            n => Row::Line {
                section,
                line: n - 1,
            },
        })
    }

    /// `(section, line)` for a line-row index that skips headers.
    pub fn locate_item(&self, item_index: usize) -> Option<(usize, usize)> {
        let section = self.lines.lower_bound(item_index)?;
        Some((section, item_index - self.lines.start(section)))
    }

    /// Flat index of a section's header row.
    pub fn flat_index_of_header(&self, section: usize) -> Option<usize> {
        (section < self.section_count()).then(|| self.rows.start(section))
    }

    /// Flat index of a line row, if that line is currently visible.
    pub fn flat_index_of_line(&self, section: usize, line: usize) -> Option<usize> {
        let count = *self.group_counts.get(section)?;
        (line < count).then(|| self.rows.start(section) + 1 + line)
    }

    /// Flat index of a row by section key; lines fall back to the header when hidden.
    pub fn flat_index_of(&self, key: &SectionKey, line: Option<usize>) -> Option<usize> {
        let section = self.section_position(key)?;
        line.and_then(|line| self.flat_index_of_line(section, line))
            .or_else(|| self.flat_index_of_header(section))
    }
}
