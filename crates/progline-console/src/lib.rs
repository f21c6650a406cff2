//! # progline-console
//!
//! Progress console for long-running command-line jobs.
//!
//! A [`Console`] writes status lines to any byte sink. It can replace the
//! previous line in place, limit output to one line per second, and count
//! completed units to show elapsed time and throughput.
//!
//! ## Key Types
//!
//! - [`Console`] - The progress printer
//! - [`ConsoleOptions`] - Replace / rate-limit / progress-tracking switches
//! - [`Clock`] - Source of "now" ([`SystemClock`] or [`ManualClock`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use progline_console::{Console, ConsoleOptions};
//!
//! let console = Console::new(ConsoleOptions {
//!     replace: true,
//!     limit: true,
//!     track_progress: true,
//! });
//!
//! console.start("import");
//! for row in rows {
//!     import(row);
//!     console.print("rows");
//! }
//! console.finish(true, None);
//! ```
//!
//! ## Output Shape
//!
//! With progress tracking enabled every line reads
//! `<prefix> | Running <elapsed> | <count> | <text> | <delta>/s Avg <avg>/s`.

mod clock;
mod console;
mod duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use console::{Console, ConsoleOptions, MessageProvider, DATE_TIME_FORMAT};
pub use duration::format_duration;
