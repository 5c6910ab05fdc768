//! TUI rendering and terminal management (impure shell)

mod rows;
mod search_input;
mod styles;

pub use rows::{header_line, line_row, RowRenderer};
pub use search_input::{SearchInput, SearchPrompt};
pub use styles::{ColorConfig, RowStyles};

use crate::config::keybindings::KeyBindings;
use crate::model::{KeyAction, SectionKey, SectionStatus, StateError};
use crate::orchestrator::FetchOrchestrator;
use crate::source::LogProvider;
use crate::state::{LogAction, LogState, UiEvent};
use crate::view_state::{Row, RowProjection};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Height of the search bar (border + content).
const SEARCH_INPUT_HEIGHT: u16 = 3;
/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// The state machine rejected an action
    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Keyboard focus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    /// Editing the query; `cursor` is a character offset into `buffer`.
    Search { buffer: String, cursor: usize },
}

/// Display options fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Show the time column in line rows.
    pub show_timestamps: bool,
    /// Whether styles use color.
    pub colors: ColorConfig,
}

/// Row the cursor sits on, by identity rather than position.
type CursorAnchor = (SectionKey, Option<usize>);

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B, P>
where
    B: Backend,
    P: LogProvider,
{
    terminal: Terminal<B>,
    orchestrator: FetchOrchestrator<P>,
    key_bindings: KeyBindings,
    projection: RowProjection,
    /// State the projection was built from.
    projected: Arc<LogState>,
    input_mode: InputMode,
    /// Flat row index of the cursor.
    cursor: usize,
    /// First flat row on screen.
    offset: usize,
    /// Rows in the log area at the last draw.
    page_height: usize,
    show_timestamps: bool,
    styles: RowStyles,
}

impl<P: LogProvider> TuiApp<CrosstermBackend<Stdout>, P> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen
    pub fn new(
        orchestrator: FetchOrchestrator<P>,
        key_bindings: KeyBindings,
        options: ViewOptions,
    ) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self::with_terminal(
            terminal,
            orchestrator,
            key_bindings,
            options,
        ))
    }
}

impl<B, P> TuiApp<B, P>
where
    B: Backend,
    P: LogProvider,
{
    fn with_terminal(
        terminal: Terminal<B>,
        orchestrator: FetchOrchestrator<P>,
        key_bindings: KeyBindings,
        options: ViewOptions,
    ) -> Self {
        let projected = Arc::clone(orchestrator.state());
        let projection = RowProjection::project(&projected);
        let page_height = terminal
            .size()
            .map(|size| usize::from(size.height.saturating_sub(STATUS_BAR_HEIGHT)))
            .unwrap_or(1)
            .max(1);
        Self {
            terminal,
            orchestrator,
            key_bindings,
            projection,
            projected,
            input_mode: InputMode::Normal,
            cursor: 0,
            offset: 0,
            page_height,
            show_timestamps: options.show_timestamps,
            styles: RowStyles::with_color_config(options.colors),
        }
    }

    /// Run the main event loop.
    ///
    /// Returns when user quits (q or Ctrl+C). Redraws after every key press
    /// and every fetch completion; idle otherwise.
    pub async fn run(&mut self) -> Result<(), TuiError> {
        let mut events = spawn_event_reader();
        self.draw()?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key)? {
                            return Ok(());
                        }
                    }
                    Some(_) => {}
                    None => {
                        warn!("Terminal event reader stopped");
                        return Ok(());
                    }
                },
                Some(completion) = self.orchestrator.next_completion(),
                    if self.orchestrator.in_flight_count() > 0 =>
                {
                    let anchor = self.anchor();
                    self.orchestrator.apply_completion(completion)?;
                    // Queued results land in the same frame.
                    self.orchestrator.pump()?;
                    self.restore(anchor);
                }
            }
            self.draw()?;
        }
    }

    // ===== Projection and cursor =====

    /// Rebuild the projection if the store changed since the last build.
    fn sync_projection(&mut self) {
        let state = self.orchestrator.state();
        if Arc::ptr_eq(state, &self.projected) {
            return;
        }
        self.projected = Arc::clone(state);
        self.projection = RowProjection::project(&self.projected);
        self.cursor = self.cursor.min(self.last_row());
    }

    fn last_row(&self) -> usize {
        self.projection.flat_len().saturating_sub(1)
    }

    fn cursor_row(&self) -> Option<Row> {
        self.projection.locate(self.cursor)
    }

    fn cursor_section(&self) -> Option<SectionKey> {
        let row = self.cursor_row()?;
        self.projection.section_key(row.section()).cloned()
    }

    fn anchor(&self) -> Option<CursorAnchor> {
        let row = self.cursor_row()?;
        let key = self.projection.section_key(row.section())?.clone();
        let line = match row {
            Row::Header { .. } => None,
            Row::Line { line, .. } => Some(line),
        };
        Some((key, line))
    }

    /// Re-project and keep the cursor on the same row, or on its section
    /// header once the row is gone.
    fn restore(&mut self, anchor: Option<CursorAnchor>) {
        self.sync_projection();
        if let Some(index) = anchor
            .and_then(|(key, line)| self.projection.flat_index_of(&key, line))
        {
            self.cursor = index;
        }
    }

    /// Run a state change with the cursor pinned to its row.
    fn pinned<F>(&mut self, change: F) -> Result<(), TuiError>
    where
        F: FnOnce(&mut FetchOrchestrator<P>) -> Result<(), StateError>,
    {
        let anchor = self.anchor();
        change(&mut self.orchestrator)?;
        self.restore(anchor);
        Ok(())
    }

    fn move_cursor(&mut self, delta: isize) {
        let moved = self.cursor.saturating_add_signed(delta);
        self.cursor = moved.min(self.last_row());
    }

    /// Put the cursor on the current search match, opening its section if
    /// the user had closed it.
    fn jump_to_current_match(&mut self) -> Result<(), TuiError> {
        let state = Arc::clone(self.orchestrator.state());
        let Some(current) = state.search().current_match(state.log_keys()) else {
            return Ok(());
        };
        let is_closed = state
            .section(&current.section_key)
            .is_some_and(|section| !section.is_open());
        if is_closed {
            self.orchestrator.open_section(&current.section_key)?;
        }
        self.sync_projection();
        if let Some(index) = self
            .projection
            .flat_index_of(&current.section_key, Some(current.line_index))
        {
            self.cursor = index;
        }
        Ok(())
    }

    // ===== Input =====

    /// Handle a single keyboard event.
    ///
    /// Returns `true` if the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool, TuiError> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }
        if matches!(self.input_mode, InputMode::Search { .. }) {
            self.handle_search_key(key)?;
            return Ok(false);
        }

        let Some(action) = self.key_bindings.get(key) else {
            return Ok(false);
        };
        debug!(?action, "Key action");
        let page = isize::try_from(self.page_height).unwrap_or(isize::MAX);

        match action {
            KeyAction::Quit => return Ok(true),
            KeyAction::CursorDown => self.move_cursor(1),
            KeyAction::CursorUp => self.move_cursor(-1),
            KeyAction::PageDown => self.move_cursor(page),
            KeyAction::PageUp => self.move_cursor(-page),
            KeyAction::Top => self.cursor = 0,
            KeyAction::Bottom => self.cursor = self.last_row(),
            KeyAction::ToggleSection => {
                if let Some(section) = self.cursor_section() {
                    self.pinned(|o| o.handle_event(UiEvent::SectionClick(section)))?;
                }
            }
            KeyAction::RetrySection => {
                if let Some(section) = self.cursor_section() {
                    self.pinned(|o| o.retry_section(&section))?;
                }
            }
            KeyAction::StartSearch => {
                let buffer = self.orchestrator.state().search().text().to_string();
                let cursor = buffer.chars().count();
                self.input_mode = InputMode::Search { buffer, cursor };
            }
            KeyAction::NextMatch => {
                self.orchestrator.handle_event(UiEvent::SearchNext)?;
                self.jump_to_current_match()?;
            }
            KeyAction::PrevMatch => {
                self.orchestrator.handle_event(UiEvent::SearchPrev)?;
                self.jump_to_current_match()?;
            }
            KeyAction::ClearSearch => {
                self.pinned(|o| o.dispatch(LogAction::ResetSearch))?;
            }
        }
        Ok(false)
    }

    /// Keys while the search bar has focus. Every edit re-runs the search.
    fn handle_search_key(&mut self, key: KeyEvent) -> Result<(), TuiError> {
        let InputMode::Search { buffer, cursor } = &mut self.input_mode else {
            return Ok(());
        };

        let edited = match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                return self.pinned(|o| o.dispatch(LogAction::ResetSearch));
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return self.jump_to_current_match();
            }
            KeyCode::Left => {
                *cursor = cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                *cursor = (*cursor + 1).min(buffer.chars().count());
                false
            }
            KeyCode::Backspace if *cursor > 0 => {
                let at = byte_offset(buffer, *cursor - 1);
                buffer.remove(at);
                *cursor -= 1;
                true
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let at = byte_offset(buffer, *cursor);
                buffer.insert(at, c);
                *cursor += 1;
                true
            }
            _ => false,
        };

        if edited {
            let text = buffer.clone();
            self.orchestrator
                .handle_event(UiEvent::SearchTextChange(text))?;
            self.jump_to_current_match()?;
        }
        Ok(())
    }

    // ===== Rendering =====

    /// Render the current frame
    fn draw(&mut self) -> Result<(), TuiError> {
        self.sync_projection();

        let size = self.terminal.size()?;
        let show_search = matches!(self.input_mode, InputMode::Search { .. })
            || self.orchestrator.state().search().is_active();
        let [log_area, _, _] = split_areas(Rect::new(0, 0, size.width, size.height), show_search);
        self.page_height = usize::from(log_area.height).max(1);
        self.scroll_to_cursor();

        let Self {
            terminal,
            orchestrator,
            projection,
            input_mode,
            cursor,
            offset,
            show_timestamps,
            styles,
            ..
        } = self;
        let state = orchestrator.state();
        let view = FrameView {
            state,
            projection,
            input_mode,
            cursor: *cursor,
            offset: *offset,
            show_timestamps: *show_timestamps,
            styles,
            in_flight: orchestrator.in_flight_count(),
        };
        terminal.draw(|frame| view.render(frame))?;
        Ok(())
    }

    /// Adjust the scroll offset so the cursor row is on screen.
    fn scroll_to_cursor(&mut self) {
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.page_height {
            self.offset = self.cursor + 1 - self.page_height;
        }
        self.offset = self.offset.min(self.last_row());
    }
}

/// Byte index of the `chars`-th character, or the end of the string.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

/// Log area, search bar (empty when hidden) and status bar.
fn split_areas(area: Rect, show_search: bool) -> [Rect; 3] {
    let search_height = if show_search { SEARCH_INPUT_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(search_height),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Everything one frame needs, borrowed from the app.
struct FrameView<'a> {
    state: &'a LogState,
    projection: &'a RowProjection,
    input_mode: &'a InputMode,
    cursor: usize,
    offset: usize,
    show_timestamps: bool,
    styles: &'a RowStyles,
    in_flight: usize,
}

impl FrameView<'_> {
    fn render(&self, frame: &mut Frame) {
        let show_search = matches!(self.input_mode, InputMode::Search { .. })
            || self.state.search().is_active();
        let [log_area, search_area, status_area] = split_areas(frame.area(), show_search);

        self.render_rows(frame, log_area);
        if show_search {
            self.render_search(frame, search_area);
        }
        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect) {
        if self.projection.section_count() == 0 {
            frame.render_widget(Paragraph::new("No sections"), area);
            return;
        }

        let renderer = RowRenderer::new(
            self.state,
            self.projection,
            self.show_timestamps,
            self.styles,
        );
        let end = (self.offset + usize::from(area.height)).min(self.projection.flat_len());
        let lines: Vec<Line<'static>> = (self.offset..end)
            .filter_map(|index| {
                let line = renderer.render(self.projection.locate(index)?)?;
                Some(if index == self.cursor {
                    line.patch_style(self.styles.cursor())
                } else {
                    line
                })
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let search = self.state.search();
        let prompt = match self.input_mode {
            InputMode::Search { buffer, cursor } => SearchPrompt::Typing {
                query: buffer,
                cursor: *cursor,
            },
            InputMode::Normal => SearchPrompt::Active {
                query: search.text(),
                current: search.current_index(),
                total: search.total_matches(),
            },
        };
        frame.render_widget(SearchInput::new(prompt), area);
    }

    fn status_line(&self) -> Line<'static> {
        let failed = self
            .state
            .sections()
            .filter(|s| s.status() == SectionStatus::Error)
            .count();
        let mut summary = format!(
            " {} sections · {} lines",
            self.projection.section_count(),
            self.projection.total_rows()
        );
        if self.in_flight > 0 {
            summary.push_str(&format!(" · {} loading", self.in_flight));
        }
        if failed > 0 {
            summary.push_str(&format!(" · {failed} failed"));
        }
        Line::from(vec![
            Span::styled(summary, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   enter:toggle r:retry /:search n/N:match q:quit"),
        ])
    }
}

/// Forward terminal events from a blocking reader thread.
///
/// The thread exits when the receiver is dropped or the terminal errors.
fn spawn_event_reader() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read terminal event");
                break;
            }
        }
    });
    rx
}

/// Initialize and run the TUI until the user quits.
///
/// Handles terminal setup and restores the terminal even when the loop fails.
/// Logging must be initialized by the caller.
pub async fn run_with_orchestrator<P: LogProvider>(
    orchestrator: FetchOrchestrator<P>,
    key_bindings: KeyBindings,
    options: ViewOptions,
) -> Result<(), TuiError> {
    let mut app = TuiApp::new(orchestrator, key_bindings, options)?;
    let result = app.run().await;
    restore_terminal()?;
    result
}

/// Restore terminal to normal state
///
/// Disables raw mode and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

// ===== Test Helpers =====

#[cfg(test)]
impl<B, P> TuiApp<B, P>
where
    B: Backend,
    P: LogProvider,
{
    /// Create TuiApp for testing without terminal initialization.
    pub(crate) fn new_for_test(terminal: Terminal<B>, orchestrator: FetchOrchestrator<P>) -> Self {
        Self::with_terminal(
            terminal,
            orchestrator,
            KeyBindings::default(),
            ViewOptions {
                show_timestamps: false,
                colors: ColorConfig::from_env_and_args(true),
            },
        )
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
