//! Structured logging system with visual formatting.
//!
//! This module provides the logging facade used throughout slotwise. Messages are
//! prefixed by level or drawn with Unicode box characters to give the CLI its
//! structured look. Everything is written to stderr so that command output on
//! stdout (JSON payloads, slot lists) stays machine readable.
//!
//! Logging can be switched off entirely for quiet operation, and debug messages
//! are only shown once debug output has been enabled.

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Log level enumeration for categorizing message importance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Log,  // Operational detail (debug only)
    Warn, // Non-fatal issues
    Err,  // Recoverable failures
    Crit, // Failures that stop the current command
    Info, // Status updates
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Log => "[LOG] ",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Err => "[ERR] ",
            LogLevel::Crit => "[CRIT] ",
            LogLevel::Info => "[INFO] ",
        }
    }
}

/// Main logging interface providing structured output formatting.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    ///
    /// Tests and scripted runs use this to keep stderr clean.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `[LOG]` level output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if debug output is enabled.
    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Main log function with level-based prefixes.
    ///
    /// # Arguments
    /// * `level` - LogLevel indicating message importance
    /// * `message` - Text content to log
    pub fn log(level: LogLevel, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        if level == LogLevel::Log && !Self::is_debug() {
            return;
        }

        eprintln!("{}{}", level.prefix(), message);
    }

    // ═══ Convenience Methods for Common Log Levels ═══

    pub fn log_error(message: &str) {
        Self::log(LogLevel::Err, message);
    }

    pub fn log_warning(message: &str) {
        Self::log(LogLevel::Warn, message);
    }

    pub fn log_info(message: &str) {
        Self::log(LogLevel::Info, message);
    }

    /// Log a debug message. Dropped unless debug output is enabled.
    pub fn log_debug(message: &str) {
        Self::log(LogLevel::Log, message);
    }

    pub fn log_critical(message: &str) {
        Self::log(LogLevel::Crit, message);
    }

    // ═══ Visual Formatting Functions ═══

    /// Log a decorated message with visual branching indicator.
    pub fn log_decorated(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("┣ {}", message);
    }

    /// Log an indented message for sub-items or details.
    pub fn log_indented(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("┃   {}", message);
    }

    /// Log a visual pipe separator.
    pub fn log_pipe() {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("┃");
    }

    /// Log a block start message with visual separation.
    pub fn log_block_start(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("┃");
        eprintln!("┣ {}", message);
    }

    /// Log the application version header.
    pub fn log_version() {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("┏ slotwise v{} ━━╸", env!("CARGO_PKG_VERSION"));
        eprintln!("┃");
    }

    /// Log the final termination marker.
    pub fn log_end() {
        if !Self::is_enabled() {
            return;
        }
        eprintln!("╹");
    }
}
