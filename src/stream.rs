// src/stream.rs
//
// =============================================================================
// RANKLOG: STREAM CONTROLLER (v 0.1 )
// =============================================================================
//
// Output targets are explicit handles, never process globals.
//
// - `SharedSink`:       a writer shared by reference (stdout, a log file, a buffer).
// - `StreamSlot`:       the swappable "current target" of one output channel.
//                       Cloned into every component that needs to write errors.
// - `StreamController`: redirects a slot and puts the original back on teardown,
//                       but only if nobody else replaced the target meanwhile.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// 1. SINKS
// ============================================================================

type Sink = Box<dyn Write + Send>;

#[derive(Clone)]
pub struct SharedSink(Arc<Mutex<Sink>>);

impl SharedSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Discards everything. Workers park their error target here until
    /// their log files exist.
    pub fn null() -> Self {
        Self::new(io::sink())
    }

    /// Creates (truncating) a line-buffered file sink.
    pub fn create_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(LineWriter::new(file)))
    }

    /// Identity comparison: true if both handles point at the same writer.
    pub fn same(&self, other: &SharedSink) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write_bytes(text.as_bytes())
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.0.lock().write_all(bytes)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl std::fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedSink")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

// ============================================================================
// 2. THE SLOT (current target of one channel)
// ============================================================================

#[derive(Clone, Debug)]
pub struct StreamSlot {
    current: Arc<Mutex<SharedSink>>,
}

impl StreamSlot {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            current: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn current(&self) -> SharedSink {
        self.current.lock().clone()
    }

    /// Writes to whatever target is installed right now.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write_bytes(text.as_bytes())
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        // Clone first so the slot lock is not held across the write
        let sink = self.current();
        sink.write_bytes(bytes)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.current().flush()
    }

    fn swap(&self, sink: SharedSink) -> SharedSink {
        std::mem::replace(&mut *self.current.lock(), sink)
    }

    /// Puts `original` back only if `expected` is still installed.
    fn swap_if(&self, expected: &SharedSink, original: SharedSink) -> bool {
        let mut current = self.current.lock();
        if current.same(expected) {
            *current = original;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// 3. THE CONTROLLER
// ============================================================================

pub struct StreamController {
    slot: StreamSlot,
    installed: Option<SharedSink>,
    original: Option<SharedSink>,
}

impl StreamController {
    pub fn new(slot: StreamSlot) -> Self {
        Self {
            slot,
            installed: None,
            original: None,
        }
    }

    /// Installs `target`, remembering what was there first.
    pub fn redirect(&mut self, target: SharedSink) {
        let previous = self.slot.swap(target.clone());
        // A second redirect keeps the very first original
        if self.original.is_none() {
            self.original = Some(previous);
        }
        self.installed = Some(target);
    }

    /// Restores the original target if ours is still installed.
    /// Idempotent; returns true only when something was put back.
    pub fn restore(&mut self) -> bool {
        let (Some(installed), Some(original)) = (self.installed.take(), self.original.take())
        else {
            return false;
        };

        let restored = self.slot.swap_if(&installed, original);
        if !restored {
            log::debug!("Stream target replaced by another controller; leaving it alone");
        }
        restored
    }

    pub fn is_redirected(&self) -> bool {
        self.installed.is_some()
    }

    pub fn flush(&self) -> io::Result<()> {
        match &self.installed {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    /// Flushes and releases our target. The file handle closes once the
    /// last clone (ours and the slot's) is gone.
    pub fn close(&mut self) -> io::Result<()> {
        let flushed = self.flush();
        self.restore();
        flushed
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.restore();
    }
}
