// src/logs.rs
//
// =============================================================================
// RANKLOG: MEMORY BUFFER & LOG FACADE BRIDGE (v 0.1 )
// =============================================================================
//
// 1. `LogBuffer`: a thread-safe bounded line buffer usable as an output target
//    (it implements `io::Write`). Lets embedders and tests capture a rank's
//    output without touching the terminal.
// 2. `LogBridge`: routes `log::info!` / `log::warn!` calls (ours and third-party
//    crates') into a `RankLogger`, so they obey rank verbosity and land in the
//    worker's log file instead of the coordinator's console.

use crate::logger::RankLogger;
use crate::severity::Severity;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

// ============================================================================
// 1. THE BUFFER
// ============================================================================

#[derive(Default)]
struct BufferState {
    lines: VecDeque<String>,
    // Bytes written since the last newline
    partial: String,
}

#[derive(Clone)]
pub struct LogBuffer {
    state: Arc<Mutex<BufferState>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState {
                lines: VecDeque::with_capacity(capacity),
                partial: String::new(),
            })),
            capacity,
        }
    }

    // Drops the oldest line when full
    fn push_locked(state: &mut BufferState, capacity: usize, msg: String) {
        if state.lines.len() >= capacity {
            state.lines.pop_front();
        }
        state.lines.push_back(msg);
    }

    /// Snapshot of complete lines.
    pub fn get_lines(&self) -> Vec<String> {
        self.state.lock().lines.iter().cloned().collect()
    }

    /// Everything written so far, including an unterminated tail.
    pub fn contents(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();
        for line in &state.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&state.partial);
        out
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.lines.is_empty() && state.partial.is_empty()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let mut state = self.state.lock();
        for ch in text.chars() {
            if ch == '\n' {
                let line = std::mem::take(&mut state.partial);
                Self::push_locked(&mut state, self.capacity, line);
            } else {
                state.partial.push(ch);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// 2. THE BRIDGE
// ============================================================================

pub struct LogBridge {
    logger: Arc<RankLogger>,
}

fn severity_for(level: Level) -> Severity {
    match level {
        Level::Error => Severity::Error,
        Level::Warn => Severity::Warning,
        Level::Info => Severity::Info,
        Level::Debug | Level::Trace => Severity::Debug,
    }
}

impl LogBridge {
    pub fn new(logger: Arc<RankLogger>) -> Self {
        Self { logger }
    }

    /// Installs the bridge as the `log` facade backend.
    /// Filtering is left to the rank logger's verbosity.
    pub fn init(logger: Arc<RankLogger>) -> Result<(), SetLoggerError> {
        let bridge = Box::new(LogBridge::new(logger));
        // Leak the box to create a static reference required by the 'log' crate singleton
        log::set_logger(Box::leak(bridge)).map(|()| log::set_max_level(LevelFilter::Trace))
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        severity_for(metadata.level()).rank() >= self.logger.verbosity()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Clean up target names (e.g. "ranklog::coordinator" -> "coordinator")
        let target_full = record.target();
        let target = target_full.split("::").last().unwrap_or(target_full);

        let msg = format!("{}: {}", target, record.args());
        self.logger
            .report(severity_for(record.level()), &msg, false, None);
    }

    fn flush(&self) {
        let _ = self.logger.flush();
    }
}
