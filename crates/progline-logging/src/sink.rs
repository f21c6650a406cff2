//! Byte destinations a [`Logger`](crate::Logger) fans out to.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use colored::{Color, Colorize};
use tracing_subscriber::fmt::MakeWriter;

/// Writes every buffer to each writer in turn.
///
/// Delivery is not atomic: the first failing writer's error is returned
/// and the writers after it are skipped.
pub struct MultiWriter {
    writers: Vec<Box<dyn Write + Send>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Box<dyn Write + Send>>) -> Self {
        Self { writers }
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Flush and drop every writer, returning the flush errors.
    pub fn close(&mut self) -> Vec<io::Error> {
        self.writers
            .drain(..)
            .filter_map(|mut writer| writer.flush().err())
            .collect()
    }
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Shared handle to a [`MultiWriter`], usable as a tracing writer.
#[derive(Clone)]
pub(crate) struct SharedSinks(Arc<Mutex<MultiWriter>>);

impl SharedSinks {
    pub(crate) fn new(writer: MultiWriter) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MultiWriter> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) struct SinkGuard<'a>(MutexGuard<'a, MultiWriter>);

impl Write for SinkGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedSinks {
    type Writer = SinkGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkGuard(self.lock())
    }
}

/// Wraps each written chunk in an ANSI foreground colour.
pub struct ColoredWriter<W> {
    inner: W,
    color: Option<Color>,
}

impl<W: Write> ColoredWriter<W> {
    pub fn new(inner: W, color: Option<Color>) -> Self {
        Self { inner, color }
    }
}

impl<W: Write> Write for ColoredWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(color) = self.color else {
            return self.inner.write(buf);
        };

        let text = String::from_utf8_lossy(buf);
        let (body, newline) = match text.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (text.as_ref(), ""),
        };
        write!(self.inner, "{}{}", body.color(color), newline)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Open `path` for appending, creating it (and its parent directory) with
/// `mode` permissions if needed.
pub fn open_log_file(path: &Path, mode: u32) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

#[cfg(unix)]
pub use unix::UnixSocketWriter;

#[cfg(unix)]
mod unix {
    use std::io::{self, Write};
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};

    /// Sends newline-terminated entries to a Unix domain socket.
    ///
    /// The socket is dialled on first use. A failed write redials once and
    /// retries once. While the socket cannot be dialled, entries are
    /// dropped and the write still reports success.
    pub struct UnixSocketWriter {
        path: PathBuf,
        socket: Option<UnixStream>,
    }

    impl UnixSocketWriter {
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
                socket: None,
            }
        }

        pub fn is_connected(&self) -> bool {
            self.socket.is_some()
        }

        fn dial(&mut self) {
            self.socket = UnixStream::connect(&self.path).ok();
        }
    }

    impl Write for UnixSocketWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.socket.is_none() {
                self.dial();
            }
            let Some(socket) = self.socket.as_mut() else {
                return Ok(buf.len());
            };

            let mut message = buf.to_vec();
            if !message.ends_with(b"\n") {
                message.push(b'\n');
            }

            if socket.write_all(&message).is_err() {
                self.dial();
                if let Some(socket) = self.socket.as_mut() {
                    socket.write_all(&message)?;
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            match self.socket.as_mut() {
                Some(socket) => socket.flush(),
                None => Ok(()),
            }
        }
    }
}
