//! Print With Verbosity
//!
//! Routes a message to exactly one of the seven severity channels and posts it
//! to the on-screen overlay.

use std::sync::Arc;
use std::time::Duration;

use blueprint_types::{LinearColor, LogVerbosity};
use serde::{Deserialize, Serialize};

use crate::overlay::{MessageKey, OverlaySink};

/// Tracing target for messages printed from graphs
pub const USER_MESSAGES_TARGET: &str = "LogBlueprintUserMessages";

// ─────────────────────────────────────────────────────────────────────────────
// Log Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Seven severity channels, one method per channel
pub trait LogSink: Send + Sync {
    fn fatal(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
    fn display(&self, message: &str);
    fn log(&self, message: &str);
    fn verbose(&self, message: &str);
    fn very_verbose(&self, message: &str);
}

/// Send `message` to the channel selected by `verbosity`
pub fn route(sink: &dyn LogSink, verbosity: LogVerbosity, message: &str) {
    match verbosity {
        LogVerbosity::Fatal => sink.fatal(message),
        LogVerbosity::Error => sink.error(message),
        LogVerbosity::Warning => sink.warning(message),
        LogVerbosity::Display => sink.display(message),
        LogVerbosity::Log => sink.log(message),
        LogVerbosity::Verbose => sink.verbose(message),
        LogVerbosity::VeryVerbose => sink.very_verbose(message),
    }
}

/// Sink that writes to `tracing` under [`USER_MESSAGES_TARGET`].
///
/// The fatal channel terminates by panicking unless built with
/// [`TracingLogSink::non_fatal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink {
    survive_fatal: bool,
}

impl TracingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record fatal messages at error level without panicking
    pub fn non_fatal() -> Self {
        Self {
            survive_fatal: true,
        }
    }
}

impl LogSink for TracingLogSink {
    fn fatal(&self, message: &str) {
        tracing::error!(target: USER_MESSAGES_TARGET, verbosity = "Fatal", fatal = true, "{}", message);
        if !self.survive_fatal {
            panic!("Fatal error: {message}");
        }
    }

    fn error(&self, message: &str) {
        tracing::error!(target: USER_MESSAGES_TARGET, verbosity = "Error", "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: USER_MESSAGES_TARGET, verbosity = "Warning", "{}", message);
    }

    fn display(&self, message: &str) {
        tracing::info!(target: USER_MESSAGES_TARGET, verbosity = "Display", "{}", message);
    }

    fn log(&self, message: &str) {
        tracing::info!(target: USER_MESSAGES_TARGET, verbosity = "Log", "{}", message);
    }

    fn verbose(&self, message: &str) {
        tracing::debug!(target: USER_MESSAGES_TARGET, verbosity = "Verbose", "{}", message);
    }

    fn very_verbose(&self, message: &str) {
        tracing::trace!(target: USER_MESSAGES_TARGET, verbosity = "VeryVerbose", "{}", message);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Which flag decides whether the overlay post happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayGate {
    /// Post when `print_to_log` is set. This is how the shipped node behaves.
    #[default]
    PrintToLog,
    /// Post when `print_to_screen` is set
    PrintToScreen,
}

/// Print behaviour settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintConfig {
    #[serde(default)]
    pub overlay_gate: OverlayGate,
}

/// Inputs of one print call
#[derive(Debug, Clone, PartialEq)]
pub struct PrintParams {
    pub message: String,
    pub verbosity: LogVerbosity,
    pub print_to_screen: bool,
    pub print_to_log: bool,
    pub text_color: LinearColor,
    /// Seconds the overlay slot stays visible
    pub duration: f32,
    /// Overlay dedupe key; `None` or "None" adds a fresh slot every time
    pub key: Option<String>,
}

impl Default for PrintParams {
    fn default() -> Self {
        Self {
            message: "Hello".to_string(),
            verbosity: LogVerbosity::Display,
            print_to_screen: true,
            print_to_log: true,
            text_color: LinearColor::BLUE,
            duration: 2.0,
            key: None,
        }
    }
}

impl PrintParams {
    pub fn new(message: impl Into<String>, verbosity: LogVerbosity) -> Self {
        Self {
            message: message.into(),
            verbosity,
            ..Default::default()
        }
    }

    fn overlay_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.duration.max(0.0)).unwrap_or(Duration::MAX)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Points
// ─────────────────────────────────────────────────────────────────────────────

/// Collaborators a print call writes to
#[derive(Clone)]
pub struct PrintSinks {
    pub log: Arc<dyn LogSink>,
    pub overlay: Arc<dyn OverlaySink>,
    pub config: PrintConfig,
}

impl PrintSinks {
    pub fn new(log: Arc<dyn LogSink>, overlay: Arc<dyn OverlaySink>) -> Self {
        Self {
            log,
            overlay,
            config: PrintConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PrintConfig) -> Self {
        self.config = config;
        self
    }
}

/// Print a message to its severity channel and the overlay
pub fn print_with_verbosity(sinks: &PrintSinks, params: &PrintParams) {
    if params.print_to_log {
        route(sinks.log.as_ref(), params.verbosity, &params.message);
    }

    let post = match sinks.config.overlay_gate {
        OverlayGate::PrintToLog => {
            if params.print_to_log != params.print_to_screen {
                tracing::debug!(
                    print_to_log = params.print_to_log,
                    print_to_screen = params.print_to_screen,
                    "Overlay gated on print_to_log; print_to_screen is ignored"
                );
            }
            params.print_to_log
        }
        OverlayGate::PrintToScreen => params.print_to_screen,
    };

    if post {
        sinks.overlay.add_message(
            MessageKey::from_name(params.key.as_deref()),
            params.overlay_duration(),
            params.text_color.to_color(true),
            &params.message,
        );
    }
}

/// Print with the verbosity given as the raw enum byte from a graph pin.
///
/// # Panics
///
/// Panics when `raw_verbosity` does not name a level. Graph pins only carry
/// values of the closed enum, so any other byte is a programming error.
pub fn print_with_raw_verbosity(sinks: &PrintSinks, raw_verbosity: u8, mut params: PrintParams) {
    params.verbosity = match LogVerbosity::try_from(raw_verbosity) {
        Ok(verbosity) => verbosity,
        Err(e) => panic!("invalid print verbosity: {e}"),
    };
    print_with_verbosity(sinks, &params);
}
