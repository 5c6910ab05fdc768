//! Line parser for unit log files.
//!
//! Pure functions converting raw file contents into [`LogLine`]s. Each line is
//! either a JSON object record or free text; free text is kept verbatim so
//! nothing a step printed is ever dropped.

use crate::model::{LogLevel, LogLine};
use serde::Deserialize;

/// Raw JSON record of one log line.
///
/// Unknown keys are ignored; producers attach arbitrary metadata.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, alias = "timestamp")]
    time: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default, alias = "message", alias = "msg")]
    out: Option<String>,
}

/// Result of parsing one unit's log text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    /// Parsed lines in file order.
    pub lines: Vec<LogLine>,
    /// Lines that looked like JSON but were not a valid record.
    pub malformed: usize,
}

/// Parse a single line.
///
/// Returns the line and whether it was a malformed JSON record. Malformed
/// records degrade to plain Info lines carrying the raw text.
pub fn parse_line(raw: &str) -> (LogLine, bool) {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    let trimmed = raw.trim_start();

    if !trimmed.starts_with('{') {
        return (LogLine::plain(raw), false);
    }

    match serde_json::from_str::<RawRecord>(trimmed) {
        Ok(record) => {
            let level = record
                .level
                .as_deref()
                .map(LogLevel::parse)
                .unwrap_or_default();
            let line = LogLine::new(
                record.time.unwrap_or_default(),
                level,
                record.out.unwrap_or_default(),
            );
            (line, false)
        }
        Err(_) => (LogLine::plain(raw), true),
    }
}

/// Parse a whole unit log. A trailing newline does not produce an empty line.
pub fn parse_log(text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();
    for raw in text.lines() {
        let (line, malformed) = parse_line(raw);
        if malformed {
            parsed.malformed += 1;
        }
        parsed.lines.push(line);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_record() {
        let raw = r#"{"time":"2024-05-01T12:00:00Z","level":"warn","out":"disk low"}"#;
        let (line, malformed) = parse_line(raw);

        assert!(!malformed);
        assert_eq!(line.time(), "2024-05-01T12:00:00Z");
        assert_eq!(line.level(), LogLevel::Warn);
        assert_eq!(line.out(), "disk low");
    }

    #[test]
    fn accepts_alternate_field_names() {
        let (line, _) = parse_line(r#"{"timestamp":"t1","msg":"hello"}"#);
        assert_eq!(line.time(), "t1");
        assert_eq!(line.out(), "hello");

        let (line, _) = parse_line(r#"{"message":"hi"}"#);
        assert_eq!(line.out(), "hi");
    }

    #[test]
    fn missing_fields_default_to_empty_info() {
        let (line, malformed) = parse_line(r#"{"extra": 1}"#);
        assert!(!malformed);
        assert_eq!(line, LogLine::new("", LogLevel::Info, ""));
    }

    #[test]
    fn plain_text_is_kept_verbatim() {
        let (line, malformed) = parse_line("  compiling crate v0.1.0");
        assert!(!malformed);
        assert_eq!(line.out(), "  compiling crate v0.1.0");
        assert_eq!(line.level(), LogLevel::Info);
    }

    #[test]
    fn broken_json_is_counted_and_kept() {
        let (line, malformed) = parse_line(r#"{"out": "unterminated"#);
        assert!(malformed);
        assert_eq!(line.out(), r#"{"out": "unterminated"#);
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let (_, malformed) = parse_line(r#"{"out": 42}"#);
        assert!(malformed);
    }

    #[test]
    fn carriage_return_is_stripped() {
        let (line, _) = parse_line("done\r");
        assert_eq!(line.out(), "done");
    }

    #[test]
    fn parse_log_ignores_trailing_newline() {
        let parsed = parse_log("one\ntwo\n");
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.malformed, 0);
    }

    #[test]
    fn parse_log_keeps_blank_lines_in_the_middle() {
        let parsed = parse_log("one\n\nthree");
        assert_eq!(parsed.lines.len(), 3);
        assert_eq!(parsed.lines[1].out(), "");
    }

    #[test]
    fn parse_log_counts_malformed_records() {
        let parsed = parse_log("{\"out\":\"ok\"}\n{bad\nplain\n");
        assert_eq!(parsed.lines.len(), 3);
        assert_eq!(parsed.malformed, 1);
    }

    #[test]
    fn parse_log_of_empty_text_is_empty() {
        assert_eq!(parse_log(""), ParsedLog::default());
    }
}
