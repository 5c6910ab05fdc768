//! Search engine.
//!
//! Matches are totally ordered by section order (`log_keys`), then line order,
//! then field declaration order, then occurrence order within the field text.
//! Only Loaded sections contribute matches; sections that are not loaded yet are
//! simply absent from the results.

use crate::model::{LineField, LogLine, LogSection, SectionKey};
use crate::state::LogState;
use std::collections::HashMap;

// ===== SearchOptions =====

/// How queries are matched against line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    case_sensitive: bool,
    fields: Vec<LineField>,
}

impl SearchOptions {
    /// Fields are stored in declaration order without duplicates.
    /// An empty field list falls back to searching `out` only.
    pub fn new(case_sensitive: bool, fields: impl IntoIterator<Item = LineField>) -> Self {
        let mut fields: Vec<LineField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        if fields.is_empty() {
            fields.push(LineField::Out);
        }
        Self {
            case_sensitive,
            fields,
        }
    }

    /// Whether matching compares case exactly.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Fields searched, in declaration order.
    pub fn fields(&self) -> &[LineField] {
        &self.fields
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(false, [LineField::Out])
    }
}

// ===== SearchQuery =====

/// Validated search query. Never empty.
///
/// Whitespace is significant: a query of two spaces finds runs of two
/// spaces.
#[derive(Debug, Clone)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Smart constructor: returns None only for the empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let s = raw.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// The query as typed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Query characters, folded the same way line text is folded.
    pub fn folded(&self, case_sensitive: bool) -> Vec<char> {
        self.0.chars().map(|c| fold_char(c, case_sensitive)).collect()
    }
}

// ===== Match records =====

/// `[start, start + length)` in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchSpan {
    /// First character of the span.
    pub start: usize,
    /// Span length in characters.
    pub length: usize,
}

/// All occurrences of the query in one field of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatches {
    /// Field the spans lie in.
    pub field: LineField,
    /// Occurrences, left to right.
    pub spans: Vec<MatchSpan>,
}

/// Matches of one line. Only lines with at least one match are recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatches {
    /// Position of the line in its section.
    pub line_index: usize,
    /// Per-field occurrences, in field order.
    pub fields: Vec<FieldMatches>,
}

impl LineMatches {
    /// Occurrences on this line.
    pub fn count(&self) -> usize {
        self.fields.iter().map(|f| f.spans.len()).sum()
    }
}

/// One located occurrence of the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchMatch {
    /// Section the match lies in.
    pub section_key: SectionKey,
    /// Line within the section.
    pub line_index: usize,
    /// Field of the line.
    pub field: LineField,
    /// Position of this span among the spans of the same field.
    pub occurrence: usize,
    /// First character of the match.
    pub start: usize,
    /// Match length in characters.
    pub length: usize,
}

// ===== SearchData =====

/// Search slice of the state store.
///
/// An empty `text` means no active search; in that case there are no matches and
/// no current index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchData {
    text: String,
    current_index: Option<usize>,
    matches_by_section: HashMap<SectionKey, Vec<LineMatches>>,
    options: SearchOptions,
}

impl SearchData {
    /// Inactive search using `options`.
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Query text; empty when no search is active.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a query is set.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }

    /// Zero-based index into the global match order; `None` with zero matches.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Options matches are computed with.
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Per-line matches, keyed by section.
    pub fn matches_by_section(&self) -> &HashMap<SectionKey, Vec<LineMatches>> {
        &self.matches_by_section
    }

    /// Per-line matches of one section, ordered by line index.
    pub fn matches_for(&self, key: &SectionKey) -> &[LineMatches] {
        self.matches_by_section
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Occurrences inside one section.
    pub fn section_match_count(&self, key: &SectionKey) -> usize {
        self.matches_for(key).iter().map(LineMatches::count).sum()
    }

    /// Occurrences across all sections.
    pub fn total_matches(&self) -> usize {
        self.matches_by_section
            .values()
            .flatten()
            .map(LineMatches::count)
            .sum()
    }

    /// Whether any section has a match.
    pub fn has_matches(&self) -> bool {
        !self.matches_by_section.is_empty()
    }

    /// Matches of one section in global order.
    pub fn section_matches<'a>(
        &'a self,
        key: &'a SectionKey,
    ) -> impl Iterator<Item = SearchMatch> + 'a {
        self.matches_for(key).iter().flat_map(move |line| {
            line.fields.iter().flat_map(move |field| {
                field
                    .spans
                    .iter()
                    .enumerate()
                    .map(move |(occurrence, span)| SearchMatch {
                        section_key: key.clone(),
                        line_index: line.line_index,
                        field: field.field,
                        occurrence,
                        start: span.start,
                        length: span.length,
                    })
            })
        })
    }

    /// All matches in global order.
    pub fn matches<'a>(
        &'a self,
        log_keys: &'a [SectionKey],
    ) -> impl Iterator<Item = SearchMatch> + 'a {
        log_keys
            .iter()
            .flat_map(move |key| self.section_matches(key))
    }

    /// The match at a global index.
    pub fn match_at(&self, log_keys: &[SectionKey], index: usize) -> Option<SearchMatch> {
        let mut remaining = index;
        for key in log_keys {
            let count = self.section_match_count(key);
            if remaining < count {
                return self.section_matches(key).nth(remaining);
            }
            remaining -= count;
        }
        None
    }

    /// Match at the current index.
    pub fn current_match(&self, log_keys: &[SectionKey]) -> Option<SearchMatch> {
        self.current_index
            .and_then(|index| self.match_at(log_keys, index))
    }

    // ===== Derivations used by transitions =====

    /// Fresh results for `text`; current index at the first match.
    pub(crate) fn with_results(
        &self,
        text: String,
        matches_by_section: HashMap<SectionKey, Vec<LineMatches>>,
    ) -> Self {
        let mut next = Self {
            text,
            current_index: None,
            matches_by_section,
            options: self.options.clone(),
        };
        if next.total_matches() > 0 {
            next.current_index = Some(0);
        }
        next
    }

    /// No text, no matches, no index. Options are kept.
    pub(crate) fn cleared(&self) -> Self {
        Self::new(self.options.clone())
    }

    /// Same query, all matches dropped.
    pub(crate) fn without_matches(&self) -> Self {
        Self {
            text: self.text.clone(),
            current_index: None,
            matches_by_section: HashMap::new(),
            options: self.options.clone(),
        }
    }

    pub(crate) fn with_current_index(&self, index: usize) -> Self {
        Self {
            current_index: Some(index),
            ..self.clone()
        }
    }

    /// Replace one section's matches, keeping the current match anchored.
    ///
    /// The current index follows the previously current match when it still
    /// exists, otherwise the first match after its old position, wrapping to 0.
    pub(crate) fn replace_section_matches(
        &self,
        log_keys: &[SectionKey],
        key: &SectionKey,
        matches: Vec<LineMatches>,
    ) -> Self {
        let previous = self.current_match(log_keys);

        let mut matches_by_section = self.matches_by_section.clone();
        if matches.is_empty() {
            matches_by_section.remove(key);
        } else {
            matches_by_section.insert(key.clone(), matches);
        }

        let mut next = Self {
            text: self.text.clone(),
            current_index: None,
            matches_by_section,
            options: self.options.clone(),
        };
        next.current_index = next.reanchor(log_keys, previous.as_ref());
        next
    }

    fn reanchor(&self, log_keys: &[SectionKey], previous: Option<&SearchMatch>) -> Option<usize> {
        if self.total_matches() == 0 {
            return None;
        }
        let Some(target) = previous.and_then(|m| match_position(log_keys, m)) else {
            return Some(0);
        };
        let index = self
            .matches(log_keys)
            .position(|m| match_position(log_keys, &m).is_some_and(|p| p >= target))
            .unwrap_or(0);
        Some(index)
    }
}

/// Sort key of a match in the global order.
fn match_position(
    log_keys: &[SectionKey],
    m: &SearchMatch,
) -> Option<(usize, usize, LineField, usize)> {
    let section = log_keys.iter().position(|k| *k == m.section_key)?;
    Some((section, m.line_index, m.field, m.start))
}

// ===== Search Execution =====

fn fold_char(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        return c;
    }
    // Only one-to-one foldings, so character offsets stay aligned with the source text.
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

/// Non-overlapping occurrences of `needle` in `haystack`, left to right.
///
/// `needle` must already be folded with the same `case_sensitive` setting.
pub fn find_spans(haystack: &str, needle: &[char], case_sensitive: bool) -> Vec<MatchSpan> {
    if needle.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = haystack
        .chars()
        .map(|c| fold_char(c, case_sensitive))
        .collect();

    let mut spans = Vec::new();
    let mut start = 0;
    while start + needle.len() <= chars.len() {
        if chars[start..start + needle.len()] == *needle {
            spans.push(MatchSpan {
                start,
                length: needle.len(),
            });
            start += needle.len();
        } else {
            start += 1;
        }
    }
    spans
}

/// Matches for a slice of lines, in line order.
pub fn search_lines(
    lines: &[LogLine],
    query: &SearchQuery,
    options: &SearchOptions,
) -> Vec<LineMatches> {
    let needle = query.folded(options.case_sensitive());

    lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let fields: Vec<FieldMatches> = options
                .fields()
                .iter()
                .filter_map(|&field| {
                    let spans = find_spans(line.field(field), &needle, options.case_sensitive());
                    (!spans.is_empty()).then_some(FieldMatches { field, spans })
                })
                .collect();
            (!fields.is_empty()).then_some(LineMatches { line_index, fields })
        })
        .collect()
}

/// Matches of a single section. Non-loaded sections never match.
pub fn search_section(
    section: &LogSection,
    query: &SearchQuery,
    options: &SearchOptions,
) -> Vec<LineMatches> {
    if !section.is_loaded() {
        return Vec::new();
    }
    search_lines(section.data(), query, options)
}

/// Full recomputation over every Loaded section of the store.
pub fn execute_search(
    state: &LogState,
    query: &SearchQuery,
) -> HashMap<SectionKey, Vec<LineMatches>> {
    let options = state.search().options();
    state
        .sections()
        .filter_map(|section| {
            let matches = search_section(section, query, options);
            (!matches.is_empty()).then(|| (section.key().clone(), matches))
        })
        .collect()
}

// ===== Highlighting =====

/// A span to highlight, flagged when it is the current global match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    /// First character of the span.
    pub start: usize,
    /// Span length in characters.
    pub length: usize,
    /// Whether this span is the current global match.
    pub is_current: bool,
}

/// Highlight spans of one field of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHighlights {
    /// Field the spans lie in.
    pub field: LineField,
    /// Spans, left to right.
    pub spans: Vec<HighlightSpan>,
}

/// Highlight spans for one line, given the already-resolved current match.
///
/// Renderers painting many rows should resolve `current` once per frame and call
/// this per row.
pub fn highlight_line(
    search: &SearchData,
    current: Option<&SearchMatch>,
    key: &SectionKey,
    line_index: usize,
) -> Vec<FieldHighlights> {
    let lines = search.matches_for(key);
    let Ok(pos) = lines.binary_search_by_key(&line_index, |l| l.line_index) else {
        return Vec::new();
    };

    let is_current = |field: LineField, occurrence: usize| {
        current.is_some_and(|c| {
            c.section_key == *key
                && c.line_index == line_index
                && c.field == field
                && c.occurrence == occurrence
        })
    };

    lines[pos]
        .fields
        .iter()
        .map(|field| FieldHighlights {
            field: field.field,
            spans: field
                .spans
                .iter()
                .enumerate()
                .map(|(occurrence, span)| HighlightSpan {
                    start: span.start,
                    length: span.length,
                    is_current: is_current(field.field, occurrence),
                })
                .collect(),
        })
        .collect()
}

/// Highlight spans for one line of the store.
pub fn highlight_spans(
    state: &LogState,
    key: &SectionKey,
    line_index: usize,
) -> Vec<FieldHighlights> {
    let current = state.search().current_match(state.log_keys());
    highlight_line(state.search(), current.as_ref(), key, line_index)
}

// ===== Tests =====

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
