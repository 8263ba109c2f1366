//! cilog - 带缩进和调用跟踪的日志库
//!
//! 在常规分级日志之上提供：
//!
//! - **TRACE 级别**：位于 DEBUG 之下，可注册自定义级别
//! - **缩进感知的彩色格式**：按级别选择模板，缩进深度渲染为填充标记
//! - **缩进块**：`indent` / `unindent` 成对使用，嵌套输出一目了然
//! - **调用跟踪**：`#[ftrace]` 跟踪函数，`#[ctrace]` 跟踪 `impl` 块中的方法
//!
//! ## 模块
//!
//! - **log**: 级别、日志记录、格式化器、输出器、logger 与全局 manager
//! - **trace**: 调用跟踪运行时（`Tracer`、`Traced`）
//! - **cfg**: `TypeOptions` 与 trait 注册表
//! - **bridge**: 作为 `log` crate 的后端
//!
//! ## 示例
//!
//! ```rust,no_run
//! use cilog::{ftrace, Level};
//!
//! #[ftrace]
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     cilog::init(cilog::LoggerManagerConfig::from_json(r#"{ level: "trace" }"#)?)?;
//!
//!     let logger = cilog::get_logger("app");
//!     logger.indent(Level::INFO, "start")?;
//!     add(2, 3);
//!     logger.unindent(Level::INFO, "done")?;
//!     Ok(())
//! }
//! ```

extern crate self as cilog;

pub mod bridge;
pub mod cfg;
pub mod log;
pub mod trace;

// 重新导出主要的公共 API
pub use crate::cfg::{create_trait_from_type_options, register_trait, TypeOptions};

pub use crate::log::{
    get_logger, indent, init, manager, root_logger, set_class_tracing, set_function_tracing,
    shutdown, unindent,
};
pub use crate::log::{
    IndentFormatter, IndentFormatterConfig, Level, LogError, LogRecord, Logger, LoggerManager,
    LoggerManagerConfig, MemoryAppender,
};

pub use crate::trace::{TraceConfig, Traced, Tracer};

pub use cilog_macros::{ctrace, ftrace};
