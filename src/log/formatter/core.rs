use crate::log::error::LogError;
use crate::log::log_record::LogRecord;

/// 日志格式化器 trait
///
/// 负责将 LogRecord 格式化为字符串。`depth` 为记录产生时的缩进深度，
/// 由 logger 从共享的缩进状态中读取后传入，格式化本身不读取任何全局状态。
pub trait LogFormatter: Send + Sync {
    /// 格式化日志记录
    fn format(&self, record: &LogRecord, depth: usize) -> Result<String, LogError>;
}

/// 格式化失败时的降级输出：`LEVEL name: template [args] (format error: ..)`
pub fn fallback_line(record: &LogRecord, err: &LogError) -> String {
    let mut line = format!("{} {}: {}", record.level, record.name, record.message);
    if !record.args.is_empty() {
        let args: Vec<String> = record.args.iter().map(|arg| arg.to_repr()).collect();
        line.push_str(&format!(" [{}]", args.join(", ")));
    }
    line.push_str(&format!(" (format error: {})", err));
    line
}
