use std::fmt;

use serde::Deserialize;

/// Severity of a log entry, most severe first.
///
/// A logger configured at some level emits every entry at that level or
/// more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical = 1,
    Error,
    Warning,
    Notice,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "CRITICAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Notice => "NOTICE",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Whether an entry at `entry` passes a logger configured at `self`.
    pub fn allows(&self, entry: LogLevel) -> bool {
        entry <= *self
    }

    pub(crate) fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => LogLevel::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(LogLevel::Critical),
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "notice" => Ok(LogLevel::Notice),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Foreground colour for stdout log output (ANSI 30-37).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleColor {
    Black = 30,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl From<ConsoleColor> for colored::Color {
    fn from(color: ConsoleColor) -> Self {
        match color {
            ConsoleColor::Black => colored::Color::Black,
            ConsoleColor::Red => colored::Color::Red,
            ConsoleColor::Green => colored::Color::Green,
            ConsoleColor::Yellow => colored::Color::Yellow,
            ConsoleColor::Blue => colored::Color::Blue,
            ConsoleColor::Magenta => colored::Color::Magenta,
            ConsoleColor::Cyan => colored::Color::Cyan,
            ConsoleColor::White => colored::Color::White,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_and_filtering() {
        assert!(LogLevel::Critical < LogLevel::Debug);
        assert!(LogLevel::Info.allows(LogLevel::Notice));
        assert!(LogLevel::Info.allows(LogLevel::Info));
        assert!(!LogLevel::Info.allows(LogLevel::Debug));
        assert!(!LogLevel::Critical.allows(LogLevel::Error));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("notice".parse::<LogLevel>(), Ok(LogLevel::Notice));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_ansi_codes() {
        assert_eq!(ConsoleColor::Black as u8, 30);
        assert_eq!(ConsoleColor::White as u8, 37);
    }
}
