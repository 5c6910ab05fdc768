//! Row styling.
//!
//! Colors follow the level of each line; search hits get a background so they
//! stay visible on any level color.

use crate::model::{LogLevel, SectionStatus};
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Whether styles may use color.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== RowStyles =====

/// Styles for header rows, line rows, and search highlights.
///
/// Without colors, highlights fall back to text modifiers so matches remain
/// distinguishable on monochrome terminals.
#[derive(Debug, Clone, PartialEq)]
pub struct RowStyles {
    header: Style,
    time: Style,
    error_text: Style,
    loading_text: Style,
    cursor: Style,
    search_match: Style,
    current_match: Style,
    trace: Style,
    debug: Style,
    info: Style,
    warn: Style,
    error: Style,
}

impl RowStyles {
    /// Styles honouring `NO_COLOR`.
    pub fn new() -> Self {
        Self::with_color_config(ColorConfig::from_env_and_args(false))
    }

    /// Styles for an explicit color choice.
    pub fn with_color_config(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                header: Style::default().add_modifier(Modifier::BOLD),
                time: Style::default().fg(Color::DarkGray),
                error_text: Style::default().fg(Color::Red),
                loading_text: Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
                cursor: Style::default().bg(Color::Rgb(40, 40, 60)),
                search_match: Style::default().bg(Color::Yellow).fg(Color::Black),
                current_match: Style::default()
                    .bg(Color::LightRed)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
                trace: Style::default().fg(Color::DarkGray),
                debug: Style::default().fg(Color::Blue),
                info: Style::default().fg(Color::Green),
                warn: Style::default().fg(Color::Yellow),
                error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            }
        } else {
            Self {
                header: Style::default().add_modifier(Modifier::BOLD),
                time: Style::default(),
                error_text: Style::default(),
                loading_text: Style::default().add_modifier(Modifier::ITALIC),
                cursor: Style::default().add_modifier(Modifier::BOLD),
                search_match: Style::default().add_modifier(Modifier::UNDERLINED),
                current_match: Style::default().add_modifier(Modifier::REVERSED),
                trace: Style::default(),
                debug: Style::default(),
                info: Style::default(),
                warn: Style::default(),
                error: Style::default(),
            }
        }
    }

    /// Section header rows.
    pub fn header(&self) -> Style {
        self.header
    }

    /// Time column.
    pub fn time(&self) -> Style {
        self.time
    }

    /// Row under the cursor.
    pub fn cursor(&self) -> Style {
        self.cursor
    }

    /// Level column for `level`.
    pub fn level(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Trace => self.trace,
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
        }
    }

    /// Style of the status note after a section title.
    pub fn status(&self, status: SectionStatus) -> Style {
        match status {
            SectionStatus::Error => self.error_text,
            SectionStatus::NotStarted | SectionStatus::Loading => self.loading_text,
            SectionStatus::Loaded => self.time,
        }
    }

    /// Style of a highlighted span.
    pub fn highlight(&self, is_current: bool) -> Style {
        if is_current {
            self.current_match
        } else {
            self.search_match
        }
    }
}

impl Default for RowStyles {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(no_color)]
    fn color_config_respects_no_color_flag() {
        let config = ColorConfig::from_env_and_args(true);
        assert!(
            !config.colors_enabled(),
            "--no-color flag should disable colors"
        );
    }

    #[test]
    #[serial(no_color)]
    fn color_config_respects_no_color_env_var() {
        std::env::set_var("NO_COLOR", "1");
        let config = ColorConfig::from_env_and_args(false);
        assert!(
            !config.colors_enabled(),
            "NO_COLOR env var should disable colors"
        );
        std::env::remove_var("NO_COLOR");
    }

    #[test]
    #[serial(no_color)]
    fn color_config_enables_colors_by_default() {
        std::env::remove_var("NO_COLOR");
        let config = ColorConfig::from_env_and_args(false);
        assert!(
            config.colors_enabled(),
            "Colors should be enabled by default"
        );
    }

    #[test]
    fn colored_levels_are_distinct() {
        let styles = RowStyles::with_color_config(ColorConfig { enabled: true });
        assert_ne!(styles.level(LogLevel::Error), styles.level(LogLevel::Info));
        assert_eq!(styles.level(LogLevel::Error).fg, Some(Color::Red));
    }

    #[test]
    fn no_color_strips_foregrounds() {
        let styles = RowStyles::with_color_config(ColorConfig { enabled: false });
        assert!(styles.level(LogLevel::Error).fg.is_none());
        assert!(styles.highlight(false).bg.is_none());
        assert!(styles.highlight(true).bg.is_none());
    }

    #[test]
    fn current_match_differs_from_other_matches() {
        for enabled in [true, false] {
            let styles = RowStyles::with_color_config(ColorConfig { enabled });
            assert_ne!(styles.highlight(true), styles.highlight(false));
        }
    }
}
