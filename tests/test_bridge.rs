//! `log` crate 桥接的集成测试

use anyhow::Result;
use cilog::{LoggerManagerConfig, MemoryAppender};
use std::sync::Arc;

#[test]
fn test_log_macros_routed_to_cilog() -> Result<()> {
    let mut config = LoggerManagerConfig::from_json(
        r#"{ level: "info", appenders: [], loggers: { "noisy": { level: "error" } } }"#,
    )?;
    config.formatter.colored = false;
    config.formatter.default_template = "{levelname} {name} {message}".to_string();
    cilog::init(config)?;
    let memory = MemoryAppender::default();
    cilog::manager().add_appender(Arc::new(memory.clone()))?;

    cilog::bridge::install()?;
    assert!(cilog::bridge::install().is_err());

    log::info!(target: "deps::http", "GET {} -> {}", "/", 200);
    log::debug!(target: "deps::http", "hidden");
    log::warn!(target: "noisy", "hidden");
    log::error!(target: "noisy", "failed");

    cilog::indent(cilog::Level::WARNING, "block")?;
    log::warn!(target: "deps::http", "retry");
    cilog::unindent(cilog::Level::WARNING, "block")?;

    assert_eq!(
        memory.lines(),
        vec![
            "INFO deps::http GET / -> 200",
            "ERROR noisy failed",
            "WARNING root block",
            "WARNING deps::http retry",
            "WARNING root block",
        ]
    );
    Ok(())
}
