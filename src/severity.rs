// src/severity.rs
//
// =============================================================================
// RANKLOG: VERBOSITY TABLE (v 0.1 )
// =============================================================================
//
// The fixed, ordered set of severities.
//
// debug(0) < extra(10) < info(20) < important(25) < prompt(27)
//   < warning(30) < error(50) < header(100)
//
// Names are matched exactly (case-sensitive). Prefixes carry the process rank
// on workers ("[warn-003] ") so merged output stays attributable.

use crate::error::{LogError, Result};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// 1. SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Extra,
    Info,
    Important,
    Prompt,
    Warning,
    Error,
    /// Banner text. Effectively never filtered.
    Header,
}

impl Severity {
    /// Ascending rank order.
    pub const ALL: [Severity; 8] = [
        Severity::Debug,
        Severity::Extra,
        Severity::Info,
        Severity::Important,
        Severity::Prompt,
        Severity::Warning,
        Severity::Error,
        Severity::Header,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Extra => "extra",
            Severity::Info => "info",
            Severity::Important => "important",
            Severity::Prompt => "prompt",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Header => "header",
        }
    }

    pub fn rank(self) -> u32 {
        match self {
            Severity::Debug => 0,
            Severity::Extra => 10,
            Severity::Info => 20,
            Severity::Important => 25,
            Severity::Prompt => 27,
            Severity::Warning => 30,
            Severity::Error => 50,
            Severity::Header => 100,
        }
    }

    /// Four-character tag used inside the bracketed prefix.
    fn tag(self) -> Option<&'static str> {
        match self {
            Severity::Debug => Some("dbug"),
            Severity::Extra => Some("xtra"),
            Severity::Info => Some("info"),
            Severity::Important => Some("impt"),
            Severity::Prompt => Some("prmt"),
            Severity::Warning => Some("warn"),
            Severity::Error => Some("err "),
            Severity::Header => None,
        }
    }

    /// Exact-match lookup by name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| LogError::UnknownLevel(name.to_string(), levels()))
    }

    /// Exact-match lookup by rank. No interpolation between levels.
    pub fn from_rank(rank: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.rank() == rank)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Severity names in ascending rank order.
pub fn levels() -> Vec<&'static str> {
    Severity::ALL.iter().map(|s| s.name()).collect()
}

// ============================================================================
// 2. VERBOSITY INPUT
// ============================================================================

/// A verbosity threshold as supplied by a caller: a numeric rank or a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbosityInput {
    Rank(u32),
    Name(String),
}

impl From<u32> for VerbosityInput {
    fn from(rank: u32) -> Self {
        VerbosityInput::Rank(rank)
    }
}

impl From<&str> for VerbosityInput {
    fn from(name: &str) -> Self {
        VerbosityInput::Name(name.to_string())
    }
}

impl From<String> for VerbosityInput {
    fn from(name: String) -> Self {
        VerbosityInput::Name(name)
    }
}

impl From<Severity> for VerbosityInput {
    fn from(sev: Severity) -> Self {
        VerbosityInput::Rank(sev.rank())
    }
}

impl fmt::Display for VerbosityInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbosityInput::Rank(r) => write!(f, "{}", r),
            VerbosityInput::Name(n) => write!(f, "{:?}", n),
        }
    }
}

// ============================================================================
// 3. THE TABLE
// ============================================================================

/// Per-process table of severities and their display prefixes.
/// Built once at logger construction, read-only afterwards.
#[derive(Debug, Clone)]
pub struct VerbosityTable {
    prefixes: Vec<String>,
    pad: usize,
}

impl VerbosityTable {
    pub fn new(process_rank: usize) -> Self {
        let rank_tag = if process_rank > 0 {
            format!("-{:03}", process_rank)
        } else {
            String::new()
        };

        let prefixes: Vec<String> = Severity::ALL
            .iter()
            .map(|s| match s.tag() {
                Some(tag) => format!("[{}{}] ", tag, rank_tag),
                None => String::new(),
            })
            .collect();

        let pad = prefixes.iter().map(|p| p.len()).max().unwrap_or(0);

        Self { prefixes, pad }
    }

    /// Resolves a severity name to `(rank, prefix)`.
    pub fn rank_of(&self, name: &str) -> Result<(u32, &str)> {
        let sev = Severity::from_name(name)?;
        Ok((sev.rank(), self.prefix(sev)))
    }

    pub fn prefix(&self, sev: Severity) -> &str {
        // ALL is in declaration order, so the discriminant indexes it
        &self.prefixes[sev as usize]
    }

    pub fn is_valid_rank(rank: u32) -> bool {
        Severity::from_rank(rank).is_some()
    }

    /// Width of the longest prefix; continuation lines are indented by this.
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Validates a verbosity input and returns the threshold rank.
    pub fn resolve(input: &VerbosityInput) -> Result<u32> {
        let sev = match input {
            VerbosityInput::Name(name) => Severity::from_name(name).ok(),
            VerbosityInput::Rank(rank) => Severity::from_rank(*rank),
        };
        sev.map(Severity::rank).ok_or_else(|| {
            LogError::InvalidVerbosity(
                input.to_string(),
                Severity::ALL.iter().map(|s| s.rank()).collect(),
            )
        })
    }
}
