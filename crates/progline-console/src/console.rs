use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::clock::{Clock, SystemClock};
use crate::duration::{format_duration, round_to_seconds};

/// Layout of the timestamps in start and finish banners.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PREFIX_SEPARATOR: &str = " | ";
const AUTO_PRINT_INTERVAL: Duration = Duration::from_secs(1);
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Lazily produces status text when `print` is called without any.
pub type MessageProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Behaviour switches, fixed for the lifetime of a console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Overwrite the previous line with `\r` and padding instead of appending
    pub replace: bool,
    /// Emit at most one line per wall-clock second
    pub limit: bool,
    /// Count every print and annotate lines with elapsed time and throughput
    pub track_progress: bool,
}

/// Progress printer for one logical task stream.
///
/// All methods take `&self`; share it across threads with `Arc<Console>`.
/// `start` and `finish` should be driven by a single owner of the session.
pub struct Console {
    options: ConsoleOptions,
    sink: Mutex<Box<dyn Write + Send>>,
    clock: Arc<dyn Clock>,
    provider: Option<MessageProvider>,
    /// Held by `finish` and by each auto-print step.
    session: Mutex<()>,
    prefix: Mutex<String>,
    start: Mutex<Option<DateTime<Local>>>,
    last_print: Mutex<i64>,
    last_line_len: AtomicUsize,
    completed: AtomicI64,
    previous: AtomicI64,
    finished: AtomicBool,
    ticked: AtomicBool,
}

impl Console {
    /// Create a console writing to stdout.
    pub fn new(options: ConsoleOptions) -> Self {
        Self {
            options,
            sink: Mutex::new(Box::new(io::stdout())),
            clock: Arc::new(SystemClock),
            provider: None,
            session: Mutex::new(()),
            prefix: Mutex::new(String::new()),
            start: Mutex::new(None),
            last_print: Mutex::new(0),
            last_line_len: AtomicUsize::new(0),
            completed: AtomicI64::new(0),
            previous: AtomicI64::new(0),
            finished: AtomicBool::new(false),
            ticked: AtomicBool::new(false),
        }
    }

    pub fn with_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Mutex::new(Box::new(sink));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_message_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Redirect output to a different sink.
    pub fn set_sink(&self, sink: impl Write + Send + 'static) {
        *lock(&self.sink) = Box::new(sink);
    }

    /// Units completed in the current session.
    pub fn completed(&self) -> i64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn prefix(&self) -> String {
        lock(&self.prefix).clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Begin a session: set the prefix, print the start banner and reset
    /// the completion counters.
    pub fn start(&self, prefix: impl Into<String>) {
        self.finished.store(false, Ordering::SeqCst);
        let now = self.clock.now();
        *lock(&self.start) = Some(now);
        *lock(&self.prefix) = prefix.into();

        self.print_plain(format!("Start: {}", now.format(DATE_TIME_FORMAT)));

        self.completed.store(0, Ordering::SeqCst);
        self.previous.store(0, Ordering::SeqCst);
        tracing::debug!(prefix = %self.prefix(), "progress session started");
    }

    /// Print a status line. An empty message asks the message provider,
    /// if any, for the text.
    pub fn print(&self, message: impl Into<String>) {
        let mut message = message.into();

        if self.options.track_progress {
            lock(&self.start).get_or_insert_with(|| self.clock.now());
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        let now = self.clock.now();
        if self.options.limit && !self.claim_second(now.timestamp()) {
            tracing::trace!("status line dropped by rate limit");
            return;
        }

        if message.is_empty() {
            if let Some(provider) = &self.provider {
                message = provider();
            }
        }

        if self.options.track_progress {
            message = self.annotate(&message, now);
        }

        self.emit(message);

        if self.options.track_progress {
            self.previous.store(self.completed(), Ordering::SeqCst);
        }
    }

    /// [`print`](Self::print) with a trailing newline, so the line is kept
    /// rather than replaced.
    pub fn println(&self, message: impl Into<String>) {
        let mut message = message.into();
        message.push('\n');
        self.print(message);
    }

    /// Heartbeat print. The first tick restarts the elapsed-time clock.
    pub fn tick(&self) {
        if !self.ticked.swap(true, Ordering::SeqCst) && self.options.track_progress {
            *lock(&self.start) = Some(self.clock.now());
        }
        self.print("");
    }

    pub fn new_line(&self) {
        self.write(b"\n");
    }

    /// End the session.
    ///
    /// With `print_stats` and progress tracking, prints a summary of units,
    /// total time, time per unit and units per second. A registered message
    /// provider, or else `message`, supplies a closing `Finish:` line.
    pub fn finish(&self, print_stats: bool, message: Option<&str>) {
        let _session = lock(&self.session);
        self.finished.store(true, Ordering::SeqCst);
        let count = self.completed();

        if print_stats && self.options.track_progress {
            let now = self.clock.now();
            let stamp = now.format(DATE_TIME_FORMAT);

            if count <= 0 {
                self.print_plain(format!("Finish: {} | 0 units complete", stamp));
            } else {
                let start = lock(&self.start).unwrap_or(now);
                let total = elapsed(start, now);
                let per_unit_nanos = (total.as_nanos() / count as u128).max(1);
                let per_unit =
                    Duration::from_nanos(u64::try_from(per_unit_nanos).unwrap_or(u64::MAX));
                // Integer division: 0/s once a unit takes longer than a second.
                let units_per_sec = NANOS_PER_SEC / per_unit_nanos;

                self.print_plain(format!(
                    "Finish: {} | {} units complete in {} | avg {} per unit | avg {}/s",
                    stamp,
                    count,
                    format_duration(total),
                    format_duration(per_unit),
                    units_per_sec
                ));
            }
        }

        let closing = match &self.provider {
            Some(provider) => Some(provider()),
            None => message.map(str::to_owned),
        };
        if let Some(text) = closing {
            self.print_plain(format!("Finish: {}", text));
        }

        *lock(&self.last_print) = 0;
        self.completed.store(0, Ordering::SeqCst);
        self.previous.store(0, Ordering::SeqCst);
        tracing::debug!(units = count, "progress session finished");
    }

    /// Keep the display live: once a second, until `finish`, print an empty
    /// status line without counting it as a unit.
    pub fn auto_print(self: &Arc<Self>) -> JoinHandle<()> {
        let console = Arc::clone(self);
        thread::spawn(move || loop {
            if console.is_finished() {
                return;
            }
            thread::sleep(AUTO_PRINT_INTERVAL);

            let _session = lock(&console.session);
            if console.is_finished() {
                return;
            }
            if console.options.track_progress {
                console.completed.fetch_sub(1, Ordering::SeqCst);
            }
            console.print("");
        })
    }

    /// Accept at most one print per epoch second.
    fn claim_second(&self, now: i64) -> bool {
        let mut last = lock(&self.last_print);
        if now <= *last {
            return false;
        }
        *last = now;
        true
    }

    fn annotate(&self, text: &str, now: DateTime<Local>) -> String {
        let start = lock(&self.start).unwrap_or(now);
        let count = self.completed();
        let delta = count - self.previous.load(Ordering::SeqCst);
        let running = format_duration(round_to_seconds(elapsed(start, now)));

        let (start_secs, now_secs) = (start.timestamp(), now.timestamp());
        let average = if start_secs < now_secs {
            count / (now_secs - start_secs)
        } else {
            0
        };

        let (body, newline) = match text.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (text, ""),
        };

        format!(
            "Running {} | {} | {} | {}/s Avg {}/s{}",
            running, count, body, delta, average, newline
        )
    }

    /// Banner path: never rate limited, never annotated.
    fn print_plain(&self, mut message: String) {
        message.push('\n');
        self.emit(message);
    }

    fn emit(&self, text: String) {
        let mut message = {
            let prefix = lock(&self.prefix);
            if prefix.is_empty() {
                text
            } else {
                format!("{}{}{}", prefix, PREFIX_SEPARATOR, text)
            }
        };
        let newline = message.ends_with('\n');

        if self.options.replace {
            if !message.starts_with('\r') {
                message.insert(0, '\r');
            }
            let previous = self.last_line_len.load(Ordering::SeqCst);
            if message.chars().count() <= previous {
                message = pad_over(&message, previous, newline);
            }
        } else if !newline {
            message.push('\n');
        }

        let recorded = if newline {
            0
        } else {
            message.trim().chars().count()
        };
        self.last_line_len.store(recorded, Ordering::SeqCst);

        self.write(message.as_bytes());
    }

    fn write(&self, bytes: &[u8]) {
        let mut sink = lock(&self.sink);
        let _ = sink.write_all(bytes);
        let _ = sink.flush();
    }
}

/// Pad a `\r`-led line with spaces so it covers `previous` visible chars.
fn pad_over(message: &str, previous: usize, newline: bool) -> String {
    let body = message.strip_prefix('\r').unwrap_or(message).trim_end();
    let visible = body.trim_start().chars().count();
    let padding = previous.saturating_sub(visible) + 1;

    let mut padded = String::with_capacity(1 + body.len() + padding + 1);
    padded.push('\r');
    padded.push_str(body);
    padded.extend(std::iter::repeat(' ').take(padding));
    if newline {
        padded.push('\n');
    }
    padded
}

fn elapsed(start: DateTime<Local>, now: DateTime<Local>) -> Duration {
    (now - start).to_std().unwrap_or(Duration::ZERO)
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
