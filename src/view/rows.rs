//! Rendering of projected rows into styled lines.

use super::styles::RowStyles;
use crate::model::{LineField, LogLine, LogSection, SectionStatus};
use crate::state::{highlight_line, FieldHighlights, HighlightSpan, LogState, SearchMatch};
use crate::view_state::{Row, RowProjection};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const OPEN_GLYPH: &str = "▾";
const CLOSED_GLYPH: &str = "▸";
const LINE_INDENT: &str = "  ";
const LEVEL_WIDTH: usize = 5;
/// Display cells reserved for the time column (`HH:MM:SS`).
const TIME_WIDTH: usize = 8;

/// Renders rows of one frame.
///
/// The current match is resolved once on construction, not per row.
pub struct RowRenderer<'a> {
    state: &'a LogState,
    projection: &'a RowProjection,
    current: Option<SearchMatch>,
    show_timestamps: bool,
    styles: &'a RowStyles,
}

impl<'a> RowRenderer<'a> {
    /// Renderer for one frame.
    pub fn new(
        state: &'a LogState,
        projection: &'a RowProjection,
        show_timestamps: bool,
        styles: &'a RowStyles,
    ) -> Self {
        Self {
            state,
            projection,
            current: state.search().current_match(state.log_keys()),
            show_timestamps,
            styles,
        }
    }

    /// Styled line for a row, or `None` if the row no longer matches the store.
    pub fn render(&self, row: Row) -> Option<Line<'static>> {
        let key = self.projection.section_key(row.section())?;
        let section = self.state.section(key)?;
        match row {
            Row::Header { .. } => Some(header_line(
                section,
                self.state.search().section_match_count(key),
                self.styles,
            )),
            Row::Line { line, .. } => {
                let highlights =
                    highlight_line(self.state.search(), self.current.as_ref(), key, line);
                section
                    .line(line)
                    .map(|l| line_row(l, &highlights, self.show_timestamps, self.styles))
            }
        }
    }
}

/// Status note after a section title.
fn status_note(section: &LogSection) -> Option<String> {
    match section.status() {
        SectionStatus::NotStarted if section.shows_loading() => Some("loading…".to_string()),
        SectionStatus::NotStarted => None,
        SectionStatus::Loading => Some("loading…".to_string()),
        SectionStatus::Loaded => Some(match section.data().len() {
            1 => "(1 line)".to_string(),
            n => format!("({n} lines)"),
        }),
        SectionStatus::Error => Some(format!(
            "error: {}",
            section.error_message().unwrap_or("unknown error")
        )),
    }
}

/// Header row: open/closed glyph, key, status note and match count.
///
/// Loading and error states live here so they never add rows of their own.
pub fn header_line(section: &LogSection, match_count: usize, styles: &RowStyles) -> Line<'static> {
    let glyph = if section.is_open() { OPEN_GLYPH } else { CLOSED_GLYPH };
    let mut spans = vec![Span::styled(
        format!("{glyph} {}", section.key()),
        styles.header(),
    )];

    if let Some(note) = status_note(section) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(note, styles.status(section.status())));
    }
    if match_count > 0 {
        let noun = if match_count == 1 { "match" } else { "matches" };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("[{match_count} {noun}]"),
            styles.highlight(false),
        ));
    }
    Line::from(spans)
}

fn spans_for(highlights: &[FieldHighlights], field: LineField) -> &[HighlightSpan] {
    highlights
        .iter()
        .find(|h| h.field == field)
        .map(|h| h.spans.as_slice())
        .unwrap_or(&[])
}

/// Line row: indent, time column, level column and message.
///
/// The time column shows the short clock time unless the raw timestamp has a
/// search hit, in which case the raw text is shown so offsets line up.
pub fn line_row(
    line: &LogLine,
    highlights: &[FieldHighlights],
    show_timestamps: bool,
    styles: &RowStyles,
) -> Line<'static> {
    let mut spans = vec![Span::raw(LINE_INDENT)];

    if show_timestamps {
        let time_hits = spans_for(highlights, LineField::Time);
        let shown_width = if time_hits.is_empty() {
            let time = line.display_time();
            let width = time.width();
            spans.push(Span::styled(time, styles.time()));
            width
        } else {
            spans.extend(highlighted(line.time(), time_hits, styles.time(), styles));
            line.time().width()
        };
        spans.push(Span::raw(" ".repeat(TIME_WIDTH.saturating_sub(shown_width) + 1)));
    }

    spans.push(Span::styled(
        format!("{:<width$} ", line.level().as_str(), width = LEVEL_WIDTH),
        styles.level(line.level()),
    ));
    spans.extend(highlighted(
        line.out(),
        spans_for(highlights, LineField::Out),
        Style::default(),
        styles,
    ));
    Line::from(spans)
}

/// Split `text` into plain and highlighted spans.
///
/// Span offsets are in characters, sorted and non-overlapping; offsets past
/// the end are clamped.
fn highlighted(
    text: &str,
    hits: &[HighlightSpan],
    base: Style,
    styles: &RowStyles,
) -> Vec<Span<'static>> {
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let byte_at = |offset: usize| boundaries[offset.min(boundaries.len() - 1)];

    let mut spans = Vec::new();
    let mut cursor = 0;
    for hit in hits {
        let start = byte_at(hit.start);
        let end = byte_at(hit.start + hit.length);
        if start < cursor || start >= end {
            continue;
        }
        if start > cursor {
            spans.push(Span::styled(text[cursor..start].to_string(), base));
        }
        spans.push(Span::styled(
            text[start..end].to_string(),
            base.patch(styles.highlight(hit.is_current)),
        ));
        cursor = end;
    }
    if cursor < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[cursor..].to_string(), base));
    }
    spans
}
