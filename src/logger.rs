// src/logger.rs
//
// =============================================================================
// RANKLOG: RANK LOGGER (v 0.1 )
// =============================================================================
//
// The per-process facade. One instance is built at process start and handed
// by reference (usually `Arc<RankLogger>`) to everything that logs.
//
// Emission pipeline:
// 1. Label defaults to the message text (dedup key).
// 2. Below-threshold messages are dropped before any bookkeeping.
// 3. Single-emit messages are dropped after their first sighting.
// 4. Multi-line text is right-trimmed and re-indented under the prefix.
// 5. The prefixed line goes to the current output target.

use crate::dedup::MessageDeduplicator;
use crate::error::Result;
use crate::severity::{Severity, VerbosityInput, VerbosityTable};
use crate::stream::{SharedSink, StreamSlot};
use crate::topology::RankIdentity;
use parking_lot::Mutex;

struct LoggerState {
    verbosity: u32,
    dedup: MessageDeduplicator,
}

pub struct RankLogger {
    identity: RankIdentity,
    table: VerbosityTable,
    state: Mutex<LoggerState>,
    out: StreamSlot,
    err: StreamSlot,
}

/// Generates the plain and single-emit method pair for one severity.
macro_rules! severity_methods {
    ($($plain:ident, $single:ident => $sev:expr;)*) => {
        $(
            pub fn $plain(&self, msg: impl AsRef<str>) {
                self.report($sev, msg.as_ref(), false, None);
            }

            pub fn $single(&self, msg: impl AsRef<str>, label: Option<&str>) {
                self.report($sev, msg.as_ref(), true, label);
            }
        )*
    };
}

impl RankLogger {
    /// Builds a logger writing severity output to `out` and raw error
    /// output to `err`. Starts at `info` verbosity.
    pub fn new(identity: RankIdentity, out: StreamSlot, err: StreamSlot) -> Self {
        Self {
            table: VerbosityTable::new(identity.rank),
            identity,
            state: Mutex::new(LoggerState {
                verbosity: Severity::Info.rank(),
                dedup: MessageDeduplicator::new(),
            }),
            out,
            err,
        }
    }

    /// Console wiring: the coordinator talks to the terminal; workers keep
    /// stdout but discard error output until their log files are opened.
    pub fn console(identity: RankIdentity) -> Self {
        let err = if identity.is_coordinator() {
            SharedSink::stderr()
        } else {
            SharedSink::null()
        };
        Self::new(
            identity,
            StreamSlot::new(SharedSink::stdout()),
            StreamSlot::new(err),
        )
    }

    pub fn identity(&self) -> RankIdentity {
        self.identity
    }

    pub fn table(&self) -> &VerbosityTable {
        &self.table
    }

    /// Output channel (severity-tagged messages).
    pub fn out(&self) -> &StreamSlot {
        &self.out
    }

    /// Error channel. Components that need to write raw errors take this.
    pub fn err(&self) -> &StreamSlot {
        &self.err
    }

    // -------------------------------------------------------------------------
    // VERBOSITY
    // -------------------------------------------------------------------------

    /// Accepts a severity name or an exact severity rank.
    pub fn set_verbosity(&self, level: impl Into<VerbosityInput>) -> Result<()> {
        let rank = VerbosityTable::resolve(&level.into())?;
        self.state.lock().verbosity = rank;
        Ok(())
    }

    pub fn verbosity(&self) -> u32 {
        self.state.lock().verbosity
    }

    // -------------------------------------------------------------------------
    // EMISSION
    // -------------------------------------------------------------------------

    /// String-keyed entry point. Unknown severity names are a caller bug and
    /// fail with `UnknownLevel`.
    pub fn standard_emit(
        &self,
        severity: &str,
        msg: &str,
        single: bool,
        label: Option<&str>,
    ) -> Result<bool> {
        let sev = Severity::from_name(severity)?;
        self.emit(sev, msg, single, label)
    }

    /// Returns whether the message was written.
    pub fn emit(&self, sev: Severity, msg: &str, single: bool, label: Option<&str>) -> Result<bool> {
        let label = label.unwrap_or(msg);

        {
            let mut state = self.state.lock();
            if sev.rank() < state.verbosity {
                return Ok(false);
            }
            if single && state.dedup.should_suppress(label, sev) {
                return Ok(false);
            }
        }

        let line = self.format_line(sev, msg);
        self.out.write_str(&line)?;
        Ok(true)
    }

    /// Prefix plus message, continuation lines padded under the prefix.
    pub fn format_line(&self, sev: Severity, msg: &str) -> String {
        let indent = format!("\n{}", " ".repeat(self.table.pad()));
        let body = msg.trim_end().replace('\n', &indent);
        format!("{}{}\n", self.table.prefix(sev), body)
    }

    /// Infallible emission for the convenience methods. A broken output
    /// target falls back to the error channel.
    pub(crate) fn report(&self, sev: Severity, msg: &str, single: bool, label: Option<&str>) {
        if let Err(e) = self.emit(sev, msg, single, label) {
            let _ = self.err.write_str(&format!(
                "ranklog: output target failed ({}); message follows\n{}",
                e,
                self.format_line(sev, msg)
            ));
        }
    }

    /// Unfiltered banner text.
    pub fn raw(&self, msg: impl AsRef<str>) {
        self.report(Severity::Header, msg.as_ref(), false, None);
    }

    severity_methods! {
        debug, debug_single => Severity::Debug;
        extra, extra_single => Severity::Extra;
        info, info_single => Severity::Info;
        important, important_single => Severity::Important;
        prompt_line, prompt_line_single => Severity::Prompt;
        warning, warning_single => Severity::Warning;
        error, error_single => Severity::Error;
        header, header_single => Severity::Header;
    }

    /// Verbatim text to the output channel (no prefix, no filtering).
    pub fn write_out(&self, text: &str) -> Result<()> {
        Ok(self.out.write_str(text)?)
    }

    /// Verbatim text to the error channel.
    pub fn write_err(&self, text: &str) -> Result<()> {
        Ok(self.err.write_str(text)?)
    }

    /// Untouched bytes to the output channel.
    pub fn write_out_bytes(&self, bytes: &[u8]) -> Result<()> {
        Ok(self.out.write_bytes(bytes)?)
    }

    pub fn write_err_bytes(&self, bytes: &[u8]) -> Result<()> {
        Ok(self.err.write_bytes(bytes)?)
    }

    pub fn flush(&self) -> Result<()> {
        self.out.flush()?;
        self.err.flush()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // SINGLE-EMIT BOOKKEEPING
    // -------------------------------------------------------------------------

    /// Forget single-emit history so repeated messages surface again.
    pub fn clear_single_warnings(&self) {
        self.state.lock().dedup.reset();
    }

    /// `(count, label)` pairs for warning-like single-emit labels.
    pub fn warning_counts(&self) -> Vec<(u64, String)> {
        self.state.lock().dedup.summary()
    }

    /// Summarizes every single-emit warning seen during the run.
    pub fn warning_report(&self) {
        let summary = self.warning_counts();

        self.info("----- Final Warning Count --------");
        self.info(format!("  {:^10}   {:^25}", "COUNT", "LABEL"));
        for (count, label) in summary {
            self.info(format!("  {:10}   {:<25}", count, label));
        }
        self.info("------------------------------------");
    }
}
