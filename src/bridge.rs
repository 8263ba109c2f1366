//! `log` crate 桥接
//!
//! 安装后，依赖 `log` 宏的第三方库输出会进入 cilog：
//! 以记录的 target 作为 logger 名称，级别按下表映射。
//!
//! | log   | cilog   |
//! |-------|---------|
//! | Trace | TRACE   |
//! | Debug | DEBUG   |
//! | Info  | INFO    |
//! | Warn  | WARNING |
//! | Error | ERROR   |

use crate::log::{get_logger, Level, LogRecord};
use anyhow::{anyhow, Result};

struct Bridge;

static BRIDGE: Bridge = Bridge;

impl ::log::Log for Bridge {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        get_logger(metadata.target()).is_enabled_for(map_level(metadata.level()))
    }

    fn log(&self, record: &::log::Record) {
        let logger = get_logger(record.target());
        let level = map_level(record.level());
        if !logger.is_enabled_for(level) {
            return;
        }

        let mut entry = LogRecord::new(level, record.args().to_string());
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            entry = entry.with_location(file, line);
        }
        if let Err(err) = logger.log_record(entry) {
            tracing::warn!(target = record.target(), error = %err, "bridged log record dropped");
        }
    }

    fn flush(&self) {
        if let Err(err) = crate::log::manager().flush() {
            tracing::warn!(error = %err, "flush failed");
        }
    }
}

/// `log::Level` 到 cilog 级别的映射
pub fn map_level(level: ::log::Level) -> Level {
    match level {
        ::log::Level::Trace => Level::TRACE,
        ::log::Level::Debug => Level::DEBUG,
        ::log::Level::Info => Level::INFO,
        ::log::Level::Warn => Level::WARNING,
        ::log::Level::Error => Level::ERROR,
    }
}

/// 将 cilog 注册为 `log` 的后端
///
/// 每个进程只能安装一次 `log` 后端，重复安装返回错误。
/// 过滤由各 logger 的阈值决定，`log` 的全局上限设为 Trace。
pub fn install() -> Result<()> {
    ::log::set_logger(&BRIDGE).map_err(|err| anyhow!("failed to install log bridge: {}", err))?;
    ::log::set_max_level(::log::LevelFilter::Trace);
    Ok(())
}
