// Log verbosity levels carried on print nodes
//
// Discriminants match the byte stored on the node's enum pin. Lower values are
// more severe, so the derived ordering sorts Fatal first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity channel for a printed message
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum LogVerbosity {
    Fatal = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Display = 3,
    Log = 4,
    Verbose = 5,
    VeryVerbose = 6,
}

/// Errors converting a raw pin value into a verbosity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerbosityError {
    #[error("verbosity tag out of range: {0}")]
    OutOfRange(u8),

    #[error("unknown verbosity name: {0}")]
    UnknownName(String),
}

impl LogVerbosity {
    /// Every level, most severe first
    pub const ALL: [LogVerbosity; 7] = [
        LogVerbosity::Fatal,
        LogVerbosity::Error,
        LogVerbosity::Warning,
        LogVerbosity::Display,
        LogVerbosity::Log,
        LogVerbosity::Verbose,
        LogVerbosity::VeryVerbose,
    ];

    /// Name used on enum pins and in configuration
    pub fn name(&self) -> &'static str {
        match self {
            LogVerbosity::Fatal => "Fatal",
            LogVerbosity::Error => "Error",
            LogVerbosity::Warning => "Warning",
            LogVerbosity::Display => "Display",
            LogVerbosity::Log => "Log",
            LogVerbosity::Verbose => "Verbose",
            LogVerbosity::VeryVerbose => "VeryVerbose",
        }
    }

    /// Check whether this level is at least as severe as `other`
    pub fn is_at_least(&self, other: LogVerbosity) -> bool {
        *self <= other
    }
}

impl TryFrom<u8> for LogVerbosity {
    type Error = VerbosityError;

    fn try_from(value: u8) -> Result<Self, VerbosityError> {
        LogVerbosity::ALL
            .get(value as usize)
            .copied()
            .ok_or(VerbosityError::OutOfRange(value))
    }
}

impl FromStr for LogVerbosity {
    type Err = VerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogVerbosity::ALL
            .iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| VerbosityError::UnknownName(s.to_string()))
    }
}

impl fmt::Display for LogVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
