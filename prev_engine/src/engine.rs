/// PreV Engine - process-wide state
///
/// Holds the active engine configuration and the logger behind thread-safe
/// statics. Scene graphs and renderers never reach into this state during a
/// frame; they receive the config explicitly. The statics exist so an
/// application can configure logging once and read its config back.

use std::sync::{OnceLock, RwLock};
use crate::config::EngineConfig;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Entries below this severity are dropped before reaching the logger
static MIN_SEVERITY: RwLock<LogSeverity> = RwLock::new(LogSeverity::Trace);

struct EngineState {
    config: RwLock<Option<EngineConfig>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            config: RwLock::new(None),
        }
    }
}

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Engine state manager
///
/// # Example
///
/// ```no_run
/// use prev_engine::prev::{Engine, EngineConfig};
///
/// Engine::initialize(EngineConfig::default())?;
/// let config = Engine::config()?;
/// assert_eq!(config.max_lights, 4);
/// Engine::shutdown();
/// # Ok::<(), prev_engine::prev::Error>(())
/// ```
pub struct Engine;

impl Engine {
    fn log_and_return_error(error: Error) -> Error {
        crate::engine_error!("prev::Engine", "{}", error);
        error
    }

    /// Validate and store the engine configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the engine is already
    /// initialized (call `shutdown()` first).
    pub fn initialize(config: EngineConfig) -> Result<()> {
        config.validate()?;

        let state = ENGINE_STATE.get_or_init(EngineState::new);
        let mut lock = state.config.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Engine config lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("Engine already initialized. Call Engine::shutdown() first.".to_string())
            ));
        }

        *lock = Some(config);
        crate::engine_info!("prev::Engine", "Engine initialized");
        Ok(())
    }

    /// Whether `initialize()` has been called since the last `shutdown()`
    pub fn is_initialized() -> bool {
        ENGINE_STATE.get()
            .and_then(|state| state.config.read().ok().map(|lock| lock.is_some()))
            .unwrap_or(false)
    }

    /// Copy of the active configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized.
    pub fn config() -> Result<EngineConfig> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))?;

        let lock = state.config.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Engine config lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Forget the stored configuration
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut config) = state.config.write() {
                if config.take().is_some() {
                    crate::engine_info!("prev::Engine", "Engine shut down");
                }
            }
        }
    }

    /// Reset all state for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut config) = state.config.write() {
                *config = None;
            }
        }
        Self::set_min_severity(LogSeverity::Trace);
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset the logger to `DefaultLogger`
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop entries below `severity`
    pub fn set_min_severity(severity: LogSeverity) {
        if let Ok(mut lock) = MIN_SEVERITY.write() {
            *lock = severity;
        }
    }

    /// Current severity threshold
    pub fn min_severity() -> LogSeverity {
        MIN_SEVERITY.read().map(|lock| *lock).unwrap_or(LogSeverity::Trace)
    }

    /// Log without call-site information (used by `engine_trace!` .. `engine_warn!`)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry::new(severity, source, message));
    }

    /// Log with call-site information (used by `engine_error!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry::new(severity, source, message).with_location(file, line));
    }

    fn dispatch(entry: LogEntry) {
        if entry.severity < Self::min_severity() {
            return;
        }
        if let Ok(lock) = logger_lock().read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
