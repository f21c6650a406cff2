//! # progline-logging
//!
//! Category/severity logging for command-line tools.
//!
//! A [`Logger`] renders each entry through a placeholder [`Template`] and
//! fans it out to any mix of stdout, a file, a Unix domain socket and
//! caller-supplied writers. It is built on a private `tracing` dispatcher,
//! so loggers are passed around explicitly rather than installed globally.
//!
//! ## Key Types
//!
//! - [`Logger`] - Category logging with six severities
//! - [`LoggerConfig`] - Sinks, level and template (TOML-loadable)
//! - [`LogLevel`] - `Critical` through `Debug`
//! - [`MultiWriter`] - Ordered fan-out, stops at the first failing writer
//! - [`UnixSocketWriter`] - Reconnecting socket sink (unix only)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use progline_logging::{Logger, LoggerConfig};
//!
//! let logger = Logger::new(LoggerConfig::default())?;
//! logger.info("IMPORT", format!("{} rows loaded", rows));
//! logger.stack_as_error("IMPORT", "unexpected state");
//! logger.close()?;
//! ```
//!
//! Process diagnostics (as opposed to application logs) go through
//! [`init_tracing`].

mod config;
mod diagnostics;
mod error;
mod format;
mod level;
mod logger;
mod sink;
mod stack;

pub use config::{LoggerConfig, CONFIG_FILE_NAME, DEFAULT_FORMAT};
pub use diagnostics::{init_tracing, LogFormat};
pub use error::LogError;
pub use format::{Record, Template};
pub use level::{ConsoleColor, LogLevel};
pub use logger::{LogWriter, Logger};
#[cfg(unix)]
pub use sink::UnixSocketWriter;
pub use sink::{open_log_file, ColoredWriter, MultiWriter};
pub use stack::stack;
