//! 日志模块
//!
//! 在标准的分级日志之上增加 TRACE 级别、缩进感知的彩色格式和缩进块。
//!
//! # 特性
//!
//! - 日志级别：NOTSET, TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL，可注册新级别
//! - 缩进感知的格式化器：按级别选择模板，`<color>` / `<level>` 标记着色
//! - 多种输出目标：ConsoleAppender、FileAppender、MemoryAppender
//! - 层级 logger：阈值沿父链继承，同一棵树共享缩进深度
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use cilog::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LoggerManagerConfig::from_json(r#"
//!         {
//!             level: "trace",
//!             formatter: { colored: true },
//!             appenders: [{ type: "ConsoleAppender", options: { target: "stdout" } }]
//!         }
//!     "#)?;
//!     cilog::init(config)?;
//!
//!     let logger = cilog::get_logger("app::db");
//!     logger.indent(Level::DEBUG, "connecting")?;
//!     logger.infof("pool size %d", [8])?;
//!     logger.unindent(Level::DEBUG, "connected")?;
//!
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod error;
pub mod formatter;
pub mod global;
pub mod indent;
pub mod level;
pub mod log_record;
pub mod logger;
pub mod logger_manager;
pub mod macros;

// 重新导出核心类型
pub use appender::{
    create_appender_from_options, register_appenders, ConsoleAppender, ConsoleAppenderConfig,
    FileAppender, FileAppenderConfig, LogAppender, MemoryAppender, MemoryAppenderConfig, Target,
};
pub use error::{LogError, LogResult};
pub use formatter::{
    IndentConfig, IndentFormatter, IndentFormatterConfig, LogFormatter, StyleConfig,
    DEFAULT_TEMPLATE,
};
pub use global::{
    critical, debug, error, get_logger, indent, info, init, log, manager, root_logger,
    set_class_tracing, set_function_tracing, shutdown, trace, unindent, warning,
};
pub use indent::IndentState;
pub use level::{register_level, registered_levels, resolve_name, resolve_value, IntoLevel, Level};
pub use log_record::{Accessor, ArgValue, IndentMark, LogRecord};
pub use logger::Logger;
pub use logger_manager::{LoggerManager, LoggerManagerConfig, LoggerOverride, ROOT_LOGGER_NAME};
