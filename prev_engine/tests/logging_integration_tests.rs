//! Integration tests for the Engine logging system
//!
//! These tests swap the process-wide logger, so every test is serialized.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use prev_engine::glam::Vec3;
use prev_engine::prev::component::{LightComponent, LightComponentFactory};
use prev_engine::prev::log::{CapturingLogger, LogSeverity};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::tags::{TAG_LIGHT_COMPONENT, TAG_MAIN_LIGHT};
use prev_engine::prev::scene::{LogicOp, SceneGraph, TagSet};
use prev_engine::prev::{Engine, EngineConfig, Error};
use serial_test::serial;

/// Install a fresh capturing logger and return the inspection handle
fn capture() -> CapturingLogger {
    let logger = CapturingLogger::new();
    Engine::set_min_severity(LogSeverity::Trace);
    Engine::set_logger(logger.clone());
    logger
}

fn restore() {
    Engine::set_min_severity(LogSeverity::Trace);
    Engine::reset_logger();
}

// ============================================================================
// LOGGER API
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let logger = capture();

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Engine::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    let entries = logger.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "test::module");
    assert_eq!(entries[0].message, "Test info message");
    assert_eq!(entries[1].severity, LogSeverity::Warn);
    assert_eq!(entries[2].severity, LogSeverity::Error);
    assert_eq!(entries[2].file, None);

    restore();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let logger = capture();

    Engine::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file, Some("test_file.rs"));
    assert_eq!(entries[0].line, Some(42));
    assert!(entries[0].format_plain().ends_with("(test_file.rs:42)"));

    restore();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let logger = capture();
    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    assert_eq!(logger.entries().len(), 1);

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "test", "Message 2".to_string());
    assert_eq!(logger.entries().len(), 1);

    restore();
}

#[test]
#[serial]
fn test_integration_min_severity_filters_entries() {
    let logger = capture();
    Engine::set_min_severity(LogSeverity::Warn);

    Engine::log(LogSeverity::Trace, "test", "Trace message".to_string());
    Engine::log(LogSeverity::Debug, "test", "Debug message".to_string());
    Engine::log(LogSeverity::Info, "test", "Info message".to_string());
    Engine::log(LogSeverity::Warn, "test", "Warn message".to_string());
    Engine::log(LogSeverity::Error, "test", "Error message".to_string());

    let severities: Vec<_> = logger.entries().iter().map(|entry| entry.severity).collect();
    assert_eq!(severities, vec![LogSeverity::Warn, LogSeverity::Error]);
    assert_eq!(Engine::min_severity(), LogSeverity::Warn);

    restore();
}

// ============================================================================
// ENGINE FAILURES ARE LOGGED
// ============================================================================

#[test]
#[serial]
fn test_integration_failed_lookup_logs_an_error() {
    let mut graph = SceneGraph::new(EngineConfig::default());
    let root = graph.create_node("Root");
    let light = graph.create_node("Light");
    graph.add_child(root, light).unwrap();
    helper::add_component(&mut graph, light, LightComponentFactory::create(Vec3::Y), TAG_LIGHT_COMPONENT).unwrap();

    let logger = capture();
    let result = helper::find_one::<dyn LightComponent>(&graph, root, &TagSet::from(TAG_MAIN_LIGHT), LogicOp::And);
    assert!(matches!(result, Err(Error::NodeNotFound(_))));

    let errors: Vec<_> = logger
        .entries()
        .into_iter()
        .filter(|entry| entry.severity == LogSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, "prev::NodeComponentHelper");
    assert!(errors[0].message.contains(TAG_MAIN_LIGHT));
    assert!(errors[0].file.is_some());
    assert!(errors[0].line.is_some());

    restore();
}

#[test]
#[serial]
fn test_integration_engine_lifecycle_is_logged() {
    Engine::shutdown();
    let logger = capture();

    Engine::initialize(EngineConfig::default()).unwrap();
    assert!(Engine::is_initialized());
    assert!(matches!(Engine::initialize(EngineConfig::default()), Err(Error::InitializationFailed(_))));
    Engine::shutdown();
    assert!(!Engine::is_initialized());
    assert!(matches!(Engine::config(), Err(Error::InitializationFailed(_))));

    let messages: Vec<String> = logger.entries().into_iter().map(|entry| entry.message).collect();
    assert!(messages.iter().any(|message| message == "Engine initialized"));
    assert!(messages.iter().any(|message| message == "Engine shut down"));
    assert_eq!(logger.count_at_least(LogSeverity::Error), 2);

    restore();
}
