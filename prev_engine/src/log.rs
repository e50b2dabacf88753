//! Internal logging system for the PreV engine
//!
//! Scene, component and renderer code report through the `engine_*` macros.
//! The active logger is owned by [`Engine`](crate::engine::Engine) and can be
//! swapped at runtime:
//! - `DefaultLogger` prints colored lines to stdout
//! - `CapturingLogger` keeps entries in memory (tests, end-of-run summaries)
//!
//! Error entries carry the file and line of the macro call site.

use colored::*;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use prev_engine::prev::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}", entry.format_plain());
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// A single log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Creation time
    pub timestamp: SystemTime,

    /// Emitting subsystem (e.g. "prev::SceneGraph", "prev::Renderer")
    pub source: String,

    /// Message text
    pub message: String,

    /// Source file (error entries only)
    pub file: Option<&'static str>,

    /// Source line (error entries only)
    pub line: Option<u32>,
}

impl LogEntry {
    /// Build an entry stamped with the current time
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        }
    }

    /// Attach the call-site location
    pub fn with_location(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// Format as `[timestamp] [SEVERITY] [source] message (file:line)` without colors
    pub fn format_plain(&self) -> String {
        let mut text = format!(
            "[{}] [{}] [{}] {}",
            format_timestamp(self.timestamp),
            self.severity.label(),
            self.source,
            self.message
        );
        if let (Some(file), Some(line)) = (self.file, self.line) {
            text.push_str(&format!(" ({}:{})", file, line));
        }
        text
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-node traversal detail
    Trace,

    /// Development information
    Debug,

    /// Lifecycle milestones
    Info,

    /// Suspicious but recoverable state
    Warn,

    /// Invariant violations (with file:line)
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in formatted output
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

fn format_timestamp(timestamp: SystemTime) -> String {
    let datetime: DateTime<Local> = timestamp.into();
    datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Colored console logger
///
/// Trace is grey, Debug cyan, Info green, Warn yellow, Error bold red.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let label = entry.severity.label();
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let timestamp = format_timestamp(entry.timestamp);
        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, source, entry.message, file, line
            ),
            _ => println!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
        }
    }
}

/// In-memory logger
///
/// Clones share the same buffer, so one clone can be installed with
/// `Engine::set_logger` while another is kept for inspection.
#[derive(Clone, Default)]
pub struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured entry
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of captured entries at or above `severity`
    pub fn count_at_least(&self, severity: LogSeverity) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.severity >= severity)
            .count()
    }

    /// Drop every captured entry
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// # use prev_engine::engine_trace;
/// engine_trace!("prev::SceneGraph", "visiting node #{}", 7);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::prev::Engine::log(
            $crate::prev::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
///
/// ```no_run
/// # use prev_engine::engine_debug;
/// engine_debug!("prev::UniformRing", "ring '{}' holds {} slots", "default", 1536);
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::prev::Engine::log(
            $crate::prev::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// ```no_run
/// # use prev_engine::engine_info;
/// engine_info!("prev::MasterRenderer", "{} renderers initialized", 4);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::prev::Engine::log(
            $crate::prev::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
///
/// ```no_run
/// # use prev_engine::engine_warn;
/// engine_warn!("prev::ComponentRepository", "{} components left behind", 2);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::prev::Engine::log(
            $crate::prev::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
///
/// ```no_run
/// # use prev_engine::engine_error;
/// engine_error!("prev::NodeComponentHelper", "no node tagged {}", "MainLight");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::prev::Engine::log_detailed(
            $crate::prev::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
