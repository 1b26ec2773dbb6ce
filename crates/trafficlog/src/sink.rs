//! Record sinks
//!
//! A [`Sink`] receives fully rendered records. Appends from concurrent
//! requests never interleave within one record.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use trafficlog_core::SinkError;

/// Destination for rendered records.
pub trait Sink: Send + Sync + 'static {
    /// Append one rendered record.
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).append(bytes)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).append(bytes)
    }
}

/// A pre-opened destination such as stdout, stderr or an open file.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Take the writer back.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl WriterSink<std::io::Stdout> {
    /// Standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl WriterSink<std::io::Stderr> {
    /// Standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send + 'static> Sink for WriterSink<W> {
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }
}

/// Appends to a file path, opening it for every record.
///
/// Reopening per write lets the file be rotated or removed underneath the
/// logger. Parent directories are created on demand.
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    /// Append to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let _guard = self.lock.lock().map_err(|_| SinkError::Poisoned)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}

/// Shared in-memory buffer.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the logger.
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Everything appended so far, decoded lossily.
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn append(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut buffer = self.buffer.lock().map_err(|_| SinkError::Poisoned)?;
        buffer.extend_from_slice(bytes);
        Ok(())
    }
}
