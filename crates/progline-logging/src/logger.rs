use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};

use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::format::{Template, TemplateFormat};
use crate::level::LogLevel;
use crate::sink::{open_log_file, ColoredWriter, MultiWriter, SharedSinks};
use crate::stack::stack;

/// Category used for the logger's own entries.
const LOGGER_CATEGORY: &str = "LOGGER";
/// Category for text written through [`LogWriter`].
const WRITER_CATEGORY: &str = "LOG";

/// Category/severity logger fanning out to every configured sink.
///
/// Each logger owns a private tracing dispatcher; nothing is installed
/// globally. Pass it where it is needed, typically as `Arc<Logger>`.
pub struct Logger {
    name: String,
    level: LogLevel,
    sinks: SharedSinks,
    dispatch: Dispatch,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Result<Self, LogError> {
        Self::with_writers(config, Vec::new())
    }

    /// Build a logger that also writes to `additional` writers, after the
    /// configured file, stdout and socket sinks.
    pub fn with_writers(
        config: LoggerConfig,
        additional: Vec<Box<dyn Write + Send>>,
    ) -> Result<Self, LogError> {
        let template = Template::parse(&config.format)?;

        let mut writers: Vec<Box<dyn Write + Send>> = Vec::new();
        if let Some(path) = &config.file {
            match open_log_file(path, config.file_mode) {
                Ok(file) => writers.push(Box::new(file)),
                Err(source) => {
                    return Err(LogError::OpenFile {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        if config.stdout {
            let color = config.stdout_color.map(Into::into);
            writers.push(Box::new(ColoredWriter::new(io::stdout(), color)));
        }
        if let Some(socket) = socket_writer(&config) {
            writers.push(socket);
        }
        writers.extend(additional);

        tracing::debug!(
            sinks = writers.len(),
            file = ?config.file,
            socket = ?config.unix_socket,
            "logger sinks opened"
        );

        let sinks = SharedSinks::new(MultiWriter::new(writers));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sinks.clone())
            .with_max_level(LevelFilter::TRACE)
            .event_format(TemplateFormat::new(template))
            .finish();

        let logger = Self {
            name: config.name,
            level: config.level,
            sinks,
            dispatch: Dispatch::new(subscriber),
        };
        logger.info(LOGGER_CATEGORY, "Logger initialised");
        Ok(logger)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Log at `level` with an explicit caller location.
    pub fn log(
        &self,
        level: LogLevel,
        category: &str,
        message: impl fmt::Display,
        location: &'static Location<'static>,
    ) {
        if !self.level.allows(level) {
            return;
        }
        let message = message.to_string();
        let module = self.name.as_str();

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    category,
                    severity = level.as_str(),
                    module,
                    caller_file = location.file(),
                    caller_line = location.line(),
                    "{}",
                    message
                )
            };
        }

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Critical | LogLevel::Error => emit!(Level::ERROR),
            LogLevel::Warning => emit!(Level::WARN),
            LogLevel::Notice | LogLevel::Info => emit!(Level::INFO),
            LogLevel::Debug => emit!(Level::DEBUG),
        });
    }

    #[track_caller]
    pub fn critical(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Critical, category, message, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Error, category, message, Location::caller());
    }

    #[track_caller]
    pub fn warning(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Warning, category, message, Location::caller());
    }

    #[track_caller]
    pub fn notice(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Notice, category, message, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Info, category, message, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, category: &str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, category, message, Location::caller());
    }

    /// Log at critical level, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, category: &str, message: impl fmt::Display) -> ! {
        self.log(LogLevel::Critical, category, message, Location::caller());
        let _ = self.sinks.lock().flush();
        std::process::exit(1);
    }

    /// Log at critical level, then panic with the same message.
    #[track_caller]
    pub fn panic(&self, category: &str, message: impl fmt::Display) -> ! {
        let message = message.to_string();
        self.log(LogLevel::Critical, category, &message, Location::caller());
        panic!("{}", message);
    }

    /// Log `message` (or "Stack info") followed by the current stack trace.
    #[track_caller]
    pub fn stack_as_error(&self, category: &str, message: &str) {
        self.log(
            LogLevel::Error,
            category,
            with_stack(message),
            Location::caller(),
        );
    }

    #[track_caller]
    pub fn stack_as_critical(&self, category: &str, message: &str) {
        self.log(
            LogLevel::Critical,
            category,
            with_stack(message),
            Location::caller(),
        );
    }

    /// A `Write` handle that logs each written chunk at info level.
    pub fn writer(self: &Arc<Self>) -> LogWriter {
        LogWriter {
            logger: Arc::clone(self),
        }
    }

    /// Flush and release every sink. All flush failures are reported
    /// together.
    pub fn close(&self) -> Result<(), LogError> {
        let errors = self.sinks.lock().close();
        if errors.is_empty() {
            return Ok(());
        }

        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Err(LogError::Close(joined))
    }
}

fn with_stack(message: &str) -> String {
    let message = if message.is_empty() {
        "Stack info"
    } else {
        message
    };
    format!("{}\n{}", message, stack())
}

#[cfg(unix)]
fn socket_writer(config: &LoggerConfig) -> Option<Box<dyn Write + Send>> {
    let path = config.unix_socket.as_ref()?;
    Some(Box::new(crate::sink::UnixSocketWriter::new(path)))
}

#[cfg(not(unix))]
fn socket_writer(config: &LoggerConfig) -> Option<Box<dyn Write + Send>> {
    if config.unix_socket.is_some() {
        tracing::warn!("unix socket logging is not supported on this platform");
    }
    None
}

/// Adapter that turns a [`Logger`] into an `io::Write` sink, e.g. for a
/// progress console. Blank chunks are skipped.
///
/// Entries are logged under the `LOG` category. Their `%{file}` and
/// `%{line}` point at this adapter, not at the code that wrote the bytes.
#[derive(Clone)]
pub struct LogWriter {
    logger: Arc<Logger>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let text = text.trim();
        if !text.is_empty() {
            self.logger
                .log(LogLevel::Info, WRITER_CATEGORY, text, Location::caller());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.logger.sinks.lock().flush()
    }
}
