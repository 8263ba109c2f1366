use crate::log::level::IntoLevel;
use crate::log::logger_manager::{LoggerManager, LoggerManagerConfig};
use crate::log::Logger;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// 全局 LoggerManager 单例
///
/// 默认配置：WARNING 阈值，输出到 stderr 的彩色缩进格式
static GLOBAL_LOGGER_MANAGER: Lazy<RwLock<Arc<LoggerManager>>> = Lazy::new(|| {
    RwLock::new(Arc::new(
        LoggerManager::new(LoggerManagerConfig::default())
            .expect("Failed to create global LoggerManager"),
    ))
});

fn replace_manager(manager: LoggerManager) -> Result<Arc<LoggerManager>> {
    let mut global = GLOBAL_LOGGER_MANAGER
        .write()
        .map_err(|_| anyhow!("global logger manager lock poisoned"))?;
    Ok(std::mem::replace(&mut *global, Arc::new(manager)))
}

/// 初始化全局 LoggerManager
///
/// 之前的 manager 会先刷新输出器再被替换；已经取得的旧 logger 仍可使用，
/// 但不再属于全局树。
///
/// # 示例
///
/// ```ignore
/// fn example() -> anyhow::Result<()> {
///     let config = cilog::LoggerManagerConfig::from_json(r#"{ level: "trace" }"#)?;
///     cilog::init(config)?;
///     Ok(())
/// }
/// ```
pub fn init(config: LoggerManagerConfig) -> Result<()> {
    let manager = LoggerManager::new(config)?;
    let previous = replace_manager(manager)?;
    previous.flush()
}

/// 关闭全局 LoggerManager：刷新输出器并恢复默认配置
pub fn shutdown() -> Result<()> {
    let previous = replace_manager(LoggerManager::new(LoggerManagerConfig::default())?)?;
    previous.flush()
}

/// 获取全局 LoggerManager
pub fn manager() -> Arc<LoggerManager> {
    match GLOBAL_LOGGER_MANAGER.read() {
        Ok(manager) => Arc::clone(&manager),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

/// 获取（必要时创建）指定名称的 logger（全局）
pub fn get_logger(name: &str) -> Arc<Logger> {
    manager().get_logger(name)
}

/// 获取根 logger（全局）
pub fn root_logger() -> Arc<Logger> {
    manager().root_logger()
}

/// 打开或关闭函数跟踪，下一次调用时生效
pub fn set_function_tracing(enabled: bool) {
    manager().set_function_tracing(enabled)
}

/// 打开或关闭类型方法跟踪，下一次调用时生效
pub fn set_class_tracing(enabled: bool) {
    manager().set_class_tracing(enabled)
}

// ========== 根 logger 的便捷 log 方法 ==========

/// 使用根 logger 记录日志
pub fn log(level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
    root_logger().log(level, message)
}

/// 使用根 logger 开启缩进块
pub fn indent(level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
    root_logger().indent(level, message)
}

/// 使用根 logger 结束缩进块
pub fn unindent(level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
    root_logger().unindent(level, message)
}

/// 使用根 logger 记录 TRACE 级别日志
pub fn trace(message: impl Into<String>) -> Result<()> {
    root_logger().trace(message)
}

/// 使用根 logger 记录 DEBUG 级别日志
pub fn debug(message: impl Into<String>) -> Result<()> {
    root_logger().debug(message)
}

/// 使用根 logger 记录 INFO 级别日志
pub fn info(message: impl Into<String>) -> Result<()> {
    root_logger().info(message)
}

/// 使用根 logger 记录 WARNING 级别日志
pub fn warning(message: impl Into<String>) -> Result<()> {
    root_logger().warning(message)
}

/// 使用根 logger 记录 ERROR 级别日志
pub fn error(message: impl Into<String>) -> Result<()> {
    root_logger().error(message)
}

/// 使用根 logger 记录 CRITICAL 级别日志
pub fn critical(message: impl Into<String>) -> Result<()> {
    root_logger().critical(message)
}
