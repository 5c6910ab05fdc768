//! Search input widget for rendering the search bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// What the search bar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPrompt<'a> {
    /// Query being edited; `cursor` is a character offset.
    Typing {
        /// Text typed so far.
        query: &'a str,
        /// Character offset of the caret.
        cursor: usize,
    },
    /// Confirmed query with its match position.
    Active {
        /// Confirmed query.
        query: &'a str,
        /// Zero-based index of the current match.
        current: Option<usize>,
        /// Number of matches.
        total: usize,
    },
}

/// Search input widget.
pub struct SearchInput<'a> {
    prompt: SearchPrompt<'a>,
}

impl<'a> SearchInput<'a> {
    /// Widget showing `prompt`.
    pub fn new(prompt: SearchPrompt<'a>) -> Self {
        Self { prompt }
    }
}

/// "3/12", "0/0" when nothing matched.
fn position_label(current: Option<usize>, total: usize) -> String {
    match current {
        Some(index) => format!("{}/{}", index + 1, total),
        None => format!("0/{}", total),
    }
}

impl Widget for SearchInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.prompt {
            SearchPrompt::Typing { query, cursor } => {
                let before: String = query.chars().take(cursor).collect();
                let mut after = query.chars().skip(cursor);
                let cursor_char = after.next().map(String::from).unwrap_or_else(|| " ".into());
                let after_text: String = after.collect();

                let spans = vec![
                    Span::raw(before),
                    Span::styled(
                        cursor_char,
                        Style::default()
                            .bg(Color::White)
                            .fg(Color::Black)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(after_text),
                ];

                let paragraph = Paragraph::new(Line::from(spans)).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Search")
                        .style(Style::default().bg(Color::DarkGray)),
                );

                paragraph.render(area, buf);
            }
            SearchPrompt::Active {
                query,
                current,
                total,
            } => {
                let title = format!("Search ({})", position_label(current, total));
                let paragraph = Paragraph::new(Line::from(query)).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title)
                        .style(Style::default().bg(Color::Blue)),
                );

                paragraph.render(area, buf);
            }
        }
    }
}
