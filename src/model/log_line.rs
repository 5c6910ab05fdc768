//! The atomic displayable unit of an execution log.
//!
//! A `LogLine` is immutable once created. A new fetch replaces the whole line
//! array of a section, it never patches individual lines.

use chrono::DateTime;
use serde::Deserialize;
use std::fmt;

// ===== LogLevel =====

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum LogLevel {
    /// Finest-grained diagnostics.
    Trace,
    /// Diagnostics.
    Debug,
    /// Normal output. Also the level of unlabelled lines.
    #[default]
    Info,
    /// Something looks wrong but the step went on.
    Warn,
    /// The step reported a failure.
    Error,
}

impl LogLevel {
    /// Lenient parse. Unknown or empty strings map to `Info`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" | "err" | "fatal" | "critical" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Upper-case label shown in the level column.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== LineField =====

/// Free-text fields of a line that search can address.
///
/// Variant order is the field declaration order used when ordering matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineField {
    /// The timestamp text as delivered by the provider.
    Time,
    /// The raw message.
    Out,
}

impl LineField {
    /// All fields in declaration order.
    pub const ALL: [LineField; 2] = [LineField::Time, LineField::Out];

    /// Lower-case name used in config files.
    pub fn name(&self) -> &'static str {
        match self {
            LineField::Time => "time",
            LineField::Out => "out",
        }
    }

    /// Inverse of [`LineField::name`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "time" => Some(LineField::Time),
            "out" => Some(LineField::Out),
            _ => None,
        }
    }
}

impl fmt::Display for LineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ===== LogLine =====

/// One line of a unit's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    time: String,
    level: LogLevel,
    out: String,
}

impl LogLine {
    /// Line with every field given.
    pub fn new(time: impl Into<String>, level: LogLevel, out: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            level,
            out: out.into(),
        }
    }

    /// Line with no timestamp at `Info` level.
    pub fn plain(out: impl Into<String>) -> Self {
        Self::new(String::new(), LogLevel::Info, out)
    }

    /// Timestamp text as delivered; may be empty.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Severity.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The message text.
    pub fn out(&self) -> &str {
        &self.out
    }

    /// Text of the given free-text field.
    pub fn field(&self, field: LineField) -> &str {
        match field {
            LineField::Time => &self.time,
            LineField::Out => &self.out,
        }
    }

    /// Short clock time for display.
    ///
    /// RFC 3339 timestamps are shortened to `HH:MM:SS`; anything else is shown verbatim.
    pub fn display_time(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.time) {
            Ok(ts) => ts.format("%H:%M:%S").to_string(),
            Err(_) => self.time.clone(),
        }
    }
}
