//! Domain-level keyboard actions independent of key bindings.

/// Domain-level actions that can be mapped to configurable key bindings.
///
/// These represent user intent, not specific keys. The mapping from
/// crossterm::event::KeyEvent to KeyAction is handled by KeyBindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    // Cursor movement
    /// Move the row cursor up by one row. Default: k/↑
    CursorUp,
    /// Move the row cursor down by one row. Default: j/↓
    CursorDown,
    /// Move up by one page height. Default: Ctrl+u/Page Up
    PageUp,
    /// Move down by one page height. Default: Ctrl+d/Page Down
    PageDown,
    /// Jump to the first row. Default: g/Home
    Top,
    /// Jump to the last row. Default: G/End
    Bottom,

    // Sections
    /// Open or close the section under the cursor, fetching it if needed. Default: Enter/Space
    ToggleSection,
    /// Reset the section under the cursor and fetch it again. Default: r
    RetrySection,

    // Search
    /// Activate the search input. Default: //Ctrl+f
    StartSearch,
    /// Jump to the next search match. Default: n
    NextMatch,
    /// Jump to the previous search match. Default: N
    PrevMatch,
    /// Clear the active search. Default: Esc
    ClearSearch,

    // Application
    /// Quit the application. Default: q
    Quit,
}
