//! Unit tests for error.rs
//!
//! Tests Error variants, Display output, and the engine_err!/engine_bail! macros.

use crate::error::{Error, Result};
use crate::engine::Engine;
use crate::log::{CapturingLogger, LogSeverity};
use serial_test::serial;

/// Entries emitted by these tests (other tests may log concurrently)
fn own_entries(logger: &CapturingLogger) -> Vec<crate::log::LogEntry> {
    logger.entries().into_iter().filter(|e| e.source == "prev::Test").collect()
}

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_component_not_found_display() {
    let err = Error::ComponentNotFound("TransformComponent on node #3".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Component not found"));
    assert!(display.contains("TransformComponent on node #3"));
}

#[test]
fn test_node_not_found_display() {
    let err = Error::NodeNotFound("tags {MainLight}".to_string());
    assert_eq!(format!("{}", err), "Node not found: tags {MainLight}");
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory("ring 'default' budget 4".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Out of uniform memory"));
    assert!(display.contains("budget 4"));
}

#[test]
fn test_remaining_variants_display() {
    assert!(format!("{}", Error::InvalidNode("stale".to_string())).starts_with("Invalid node"));
    assert!(format!("{}", Error::InvalidResource("image".to_string())).starts_with("Invalid resource"));
    assert!(format!("{}", Error::BackendError("lost".to_string())).starts_with("Backend error"));
    assert!(format!("{}", Error::InitializationFailed("twice".to_string())).starts_with("Initialization failed"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::NodeNotFound("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_and_eq() {
    let err = Error::ComponentNotFound("LightComponent".to_string());
    assert!(format!("{:?}", err).contains("ComponentNotFound"));
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::NodeNotFound("LightComponent".to_string()));
}

// ============================================================================
// RESULT / PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::ComponentNotFound("ShadowsComponent".to_string()))
    }

    fn outer() -> Result<i32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::ComponentNotFound("ShadowsComponent".to_string())));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_defaults_to_backend_error() {
    let logger = CapturingLogger::new();
    Engine::set_logger(logger.clone());

    let err = crate::engine_err!("prev::Test", "device lost after {} frames", 12);
    assert_eq!(err, Error::BackendError("device lost after 12 frames".to_string()));

    let entries = own_entries(&logger);
    Engine::reset_logger();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].source, "prev::Test");
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
}

#[test]
#[serial]
fn test_engine_err_with_variant() {
    let logger = CapturingLogger::new();
    Engine::set_logger(logger.clone());

    let err = crate::engine_err!("prev::Test", @NodeNotFound, "no node tagged {}", "Shadow");
    Engine::reset_logger();

    assert_eq!(err, Error::NodeNotFound("no node tagged Shadow".to_string()));
    assert_eq!(own_entries(&logger).len(), 1);
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    fn checked(count: u32) -> Result<u32> {
        if count == 0 {
            crate::engine_bail!("prev::Test", @InitializationFailed, "count is zero");
        }
        Ok(count * 2)
    }

    let logger = CapturingLogger::new();
    Engine::set_logger(logger.clone());

    assert_eq!(checked(4), Ok(8));
    assert_eq!(checked(0), Err(Error::InitializationFailed("count is zero".to_string())));
    Engine::reset_logger();

    assert_eq!(own_entries(&logger).len(), 1);
}
