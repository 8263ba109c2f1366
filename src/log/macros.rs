//! 日志宏模块
//!
//! 提供自动捕获文件和行号信息的日志宏，参数按 `%` 风格插值
//!
//! # 示例
//!
//! ```ignore
//! let logger = cilog::get_logger(module_path!());
//!
//! // 原样输出
//! cilog::info!(logger, "application started")?;
//!
//! // 带插值参数，参数类型可以不同
//! cilog::debug!(logger, "user %s has %d items", "alice", 3)?;
//! ```

/// 以指定级别记录日志
///
/// # 示例
///
/// ```ignore
/// log_at!(logger, Level::TRACE, "x=%d", x)?;
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $logger.log_record(
            $crate::log::LogRecord::new($level, $msg)
                .with_location(file!(), line!())
                $(.with_arg($arg))*
        )
    };
}

/// 记录 TRACE 级别日志
#[macro_export]
macro_rules! trace {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::TRACE, $msg $(, $arg)*)
    };
}

/// 记录 DEBUG 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::DEBUG, $msg $(, $arg)*)
    };
}

/// 记录 INFO 级别日志
///
/// # 示例
///
/// ```ignore
/// info!(logger, "user logged in");
/// info!(logger, "user %s logged in from %s", user_id, addr);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::INFO, $msg $(, $arg)*)
    };
}

/// 记录 WARNING 级别日志
#[macro_export]
macro_rules! warning {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::WARNING, $msg $(, $arg)*)
    };
}

/// 记录 ERROR 级别日志
#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::ERROR, $msg $(, $arg)*)
    };
}

/// 记录 CRITICAL 级别日志
#[macro_export]
macro_rules! critical {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $crate::log_at!($logger, $crate::log::Level::CRITICAL, $msg $(, $arg)*)
    };
}
