//! Shared output sink for backend transcripts.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A cloneable, thread-safe writer shared between backend stages.
///
/// Parallel workers buffer their output locally and flush it through the
/// sink in one call, so interleaved transcripts stay coherent.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputSink {
    /// A sink writing to standard output.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// A sink writing to (truncating) the given file.
    pub fn to_file(path: &Path) -> io::Result<Self> {
        Ok(Self::from_writer(std::fs::File::create(path)?))
    }

    /// Wraps an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// An in-memory sink plus a handle to read the captured text back.
    pub fn memory() -> (Self, MemorySink) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let handle = MemorySink {
            buffer: buffer.clone(),
        };
        (Self::from_writer(SharedBuffer { buffer }), handle)
    }

    /// Writes a chunk of text as a single locked operation.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut writer = self.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read-back handle for [`OutputSink::memory`].
#[derive(Clone)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Everything written to the sink so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buffer = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

struct SharedBuffer {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
