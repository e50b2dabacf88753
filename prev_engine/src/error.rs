//! Error types for the PreV engine
//!
//! This module defines the error type shared by the scene graph, the
//! component repositories and the render orchestration layer, together with
//! the `engine_err!` / `engine_bail!` macros that log a failure before
//! handing it back to the caller.

use std::fmt;

/// Result type for PreV engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// PreV engine errors
///
/// Strict lookups (`get`, `remove`, `find_one` on the helper) fail with
/// `ComponentNotFound` / `NodeNotFound`. Lenient lookups never produce an
/// error; they return `None` or an empty list instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required component capability is not registered on a node
    ComponentNotFound(String),

    /// A required node (by id or by tags) does not exist in the tree
    NodeNotFound(String),

    /// A node handle does not resolve, or a tree mutation breaks the tree shape
    InvalidNode(String),

    /// Invalid resource (buffer, image, pipeline, cascade index, mesh data)
    InvalidResource(String),

    /// A uniform pool ran out of slots for the current frame
    OutOfMemory(String),

    /// GPU resource provider failure
    BackendError(String),

    /// Initialization failed (engine, renderer, configuration)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ComponentNotFound(msg) => write!(f, "Component not found: {}", msg),
            Error::NodeNotFound(msg) => write!(f, "Node not found: {}", msg),
            Error::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::OutOfMemory(msg) => write!(f, "Out of uniform memory: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error and build the matching `Error` value
///
/// The variant defaults to `BackendError`; pass `@Variant` right after the
/// source to pick another one.
///
/// # Example
///
/// ```no_run
/// # use prev_engine::engine_err;
/// let err = engine_err!("prev::Terrain", @InvalidResource, "cell ({}, {}) taken", 1, 2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, @$variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::prev::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_err!($source, @BackendError, $($arg)*)
    };
}

/// Log an error and return it from the current function
///
/// # Example
///
/// ```no_run
/// # use prev_engine::engine_bail;
/// fn check(count: u32) -> prev_engine::prev::Result<()> {
///     if count == 0 {
///         engine_bail!("prev::Config", @InitializationFailed, "count must not be zero");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, @$variant:ident, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, @$variant, $($arg)*))
    };
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
