mod pipe;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use progline_console::{Console, ConsoleOptions};
use progline_logging::{init_tracing, LogFormat, LogLevel, Logger, LoggerConfig};

/// Category for this program's own log entries.
const CATEGORY: &str = "PROGLINE";

#[derive(Parser, Debug)]
#[command(
    name = "progline",
    about = "Count lines flowing through a pipe with a live progress line",
    version,
    author
)]
struct Cli {
    /// Label printed in front of every status line
    #[arg(short, long, default_value = "progline")]
    prefix: String,

    /// Replace the status line in place instead of appending lines
    #[arg(long)]
    replace: bool,

    /// Print a status line for every input line (default: at most one per second)
    #[arg(long)]
    no_limit: bool,

    /// Disable counting and throughput figures
    #[arg(long)]
    no_progress: bool,

    /// Copy input lines to stdout
    #[arg(long)]
    tee: bool,

    /// Keep the status line updating while the input is idle
    #[arg(long)]
    auto: bool,

    /// Closing message printed when the input ends
    #[arg(short, long)]
    message: Option<String>,

    /// Logger configuration (default: <config dir>/progline/logging.toml if present)
    #[arg(long)]
    log_config: Option<PathBuf>,

    /// Also append log entries to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Emit diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Diagnostics format
    #[arg(long, value_enum, default_value = "compact")]
    diagnostics: LogFormatChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    init_tracing(level, cli.diagnostics.into());

    let logger = Arc::new(build_logger(&cli)?);

    let options = ConsoleOptions {
        replace: cli.replace,
        limit: !cli.no_limit,
        track_progress: !cli.no_progress,
    };
    let console = Arc::new(Console::new(options).with_sink(io::stderr()));

    logger.info(CATEGORY, format!("Session {} started", cli.prefix));
    console.start(cli.prefix.as_str());
    if cli.auto {
        // Exits on its own once the console is finished.
        let _ = console.auto_print();
    }

    let stdin = io::stdin().lock();
    let summary = if cli.tee {
        let mut stdout = io::stdout().lock();
        pipe::pump(stdin, Some(&mut stdout as &mut dyn Write), &console)
    } else {
        pipe::pump(stdin, None, &console)
    };

    let summary = match summary {
        Ok(summary) => summary,
        Err(e) => {
            console.finish(false, Some("input error"));
            logger.error(CATEGORY, format!("Reading input failed: {}", e));
            logger.close().context("Failed to close logger")?;
            return Err(e).context("Failed to read stdin");
        }
    };

    console.finish(true, cli.message.as_deref());
    logger.info(
        CATEGORY,
        format!(
            "Session {} finished: {} lines, {} bytes",
            cli.prefix, summary.lines, summary.bytes
        ),
    );
    logger.close().context("Failed to close logger")?;

    Ok(())
}

/// Resolve the logger configuration: explicit file, then the default
/// location, then a logger with no stdout output. Command-line flags win.
fn build_logger(cli: &Cli) -> Result<Logger> {
    let mut config = match &cli.log_config {
        Some(path) => LoggerConfig::load(path)?,
        None => LoggerConfig::load_default()?.unwrap_or_else(|| LoggerConfig {
            stdout: false,
            ..LoggerConfig::default()
        }),
    };

    if let Some(path) = &cli.log_file {
        config.file = Some(path.clone());
    }
    if let Some(level) = cli.log_level {
        config.level = level;
    }
    if cli.tee && config.stdout {
        tracing::warn!("stdout logging disabled while --tee copies input to stdout");
        config.stdout = false;
    }

    Logger::new(config).context("Failed to initialize logger")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["progline"]);
        assert_eq!(cli.prefix, "progline");
        assert!(!cli.replace);
        assert!(!cli.no_limit);
        assert!(!cli.no_progress);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cli_parses_log_level() {
        let cli = Cli::parse_from([
            "progline",
            "--log-level",
            "notice",
            "--replace",
            "-p",
            "import",
        ]);
        assert_eq!(cli.log_level, Some(LogLevel::Notice));
        assert!(cli.replace);
        assert_eq!(cli.prefix, "import");
    }

    #[test]
    fn test_build_logger_applies_overrides() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("logging.toml");
        let log_path = dir.path().join("progline.log");
        fs::write(
            &config_path,
            "stdout = true\nformat = \"%{level} %{message}\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "progline",
            "--tee",
            "--log-level",
            "warning",
            "--log-config",
            config_path.to_str().unwrap(),
            "--log-file",
            log_path.to_str().unwrap(),
        ]);

        let logger = build_logger(&cli).unwrap();
        assert_eq!(logger.level(), LogLevel::Warning);
        logger.info(CATEGORY, "hidden");
        logger.warning(CATEGORY, "kept");
        logger.close().unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "WARNING kept\n");
    }

    #[test]
    fn test_build_logger_reports_bad_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("logging.toml");
        fs::write(&config_path, "rotate = true\n").unwrap();

        let cli = Cli::parse_from(["progline", "--log-config", config_path.to_str().unwrap()]);

        assert!(build_logger(&cli).is_err());
    }
}
