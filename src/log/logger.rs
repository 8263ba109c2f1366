use crate::log::appender::LogAppender;
use crate::log::error::LogError;
use crate::log::formatter::{fallback_line, LogFormatter};
use crate::log::indent::IndentState;
use crate::log::level::{IntoLevel, Level};
use crate::log::log_record::{ArgValue, IndentMark, LogRecord};
use crate::trace::TraceFlags;
use anyhow::{anyhow, Result};
use std::sync::{Arc, RwLock};

/// 同一棵 logger 树共享的状态
pub(crate) struct LoggerContext {
    pub(crate) appenders: RwLock<Vec<Arc<dyn LogAppender>>>,
    pub(crate) indent: IndentState,
    pub(crate) trace: TraceFlags,
}

impl LoggerContext {
    pub(crate) fn new(appenders: Vec<Arc<dyn LogAppender>>, trace: TraceFlags) -> Self {
        Self {
            appenders: RwLock::new(appenders),
            indent: IndentState::new(),
            trace,
        }
    }
}

/// 日志器
///
/// 以层级名称标识（`app::db::Pool`）。级别阈值与格式化器未设置时沿父链继承，
/// 输出器、缩进深度和跟踪开关由整棵树共享。
pub struct Logger {
    name: String,
    level: RwLock<Option<Level>>,
    formatter: RwLock<Option<Arc<dyn LogFormatter>>>,
    parent: Option<Arc<Logger>>,
    context: Arc<LoggerContext>,
}

impl Logger {
    /// 创建独立的根 logger，拥有自己的缩进深度和跟踪开关
    pub fn new(
        name: impl Into<String>,
        level: Level,
        formatter: Arc<dyn LogFormatter>,
        appenders: Vec<Arc<dyn LogAppender>>,
    ) -> Self {
        let context = Arc::new(LoggerContext::new(appenders, TraceFlags::default()));
        Self::root(name, level, formatter, context)
    }

    pub(crate) fn root(
        name: impl Into<String>,
        level: Level,
        formatter: Arc<dyn LogFormatter>,
        context: Arc<LoggerContext>,
    ) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(Some(level)),
            formatter: RwLock::new(Some(formatter)),
            parent: None,
            context,
        }
    }

    pub(crate) fn child(parent: &Arc<Logger>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(None),
            formatter: RwLock::new(None),
            parent: Some(Arc::clone(parent)),
            context: Arc::clone(&parent.context),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Logger>> {
        self.parent.as_ref()
    }

    /// 自身设置的阈值（不含继承）
    pub fn level(&self) -> Option<Level> {
        self.level.read().ok().and_then(|level| *level)
    }

    /// 设置日志级别，接受 `Level`、级别名称或数值
    pub fn set_level(&self, level: impl IntoLevel) -> Result<()> {
        let level = level.into_level()?;
        *self
            .level
            .write()
            .map_err(|_| anyhow!("logger level lock poisoned"))? = Some(level);
        Ok(())
    }

    /// 清除自身阈值，改为继承父 logger
    pub fn clear_level(&self) {
        if let Ok(mut level) = self.level.write() {
            *level = None;
        }
    }

    /// 生效的阈值：自身的，否则最近祖先的，否则 NOTSET
    pub fn effective_level(&self) -> Level {
        let mut current = Some(self);
        while let Some(logger) = current {
            if let Some(level) = logger.level() {
                return level;
            }
            current = logger.parent.as_deref();
        }
        Level::NOTSET
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    /// 为当前 logger 及未单独设置的子 logger 替换格式化器
    pub fn set_formatter(&self, formatter: Arc<dyn LogFormatter>) {
        if let Ok(mut current) = self.formatter.write() {
            *current = Some(formatter);
        }
    }

    /// 生效的格式化器
    pub fn formatter(&self) -> Option<Arc<dyn LogFormatter>> {
        let mut current = Some(self);
        while let Some(logger) = current {
            if let Some(formatter) = logger.formatter.read().ok().and_then(|f| f.clone()) {
                return Some(formatter);
            }
            current = logger.parent.as_deref();
        }
        None
    }

    pub fn add_appender(&self, appender: Arc<dyn LogAppender>) -> Result<()> {
        self.context
            .appenders
            .write()
            .map_err(|_| anyhow!("appender list lock poisoned"))?
            .push(appender);
        Ok(())
    }

    /// 刷新所有输出器，返回第一个错误
    pub fn flush(&self) -> Result<()> {
        let appenders = self.appenders()?;
        let mut result = Ok(());
        for appender in &appenders {
            if let Err(err) = appender.flush() {
                result = result.and(Err(err));
            }
        }
        result
    }

    /// 当前缩进深度
    pub fn depth(&self) -> usize {
        self.context.indent.depth()
    }

    pub fn indent_state(&self) -> &IndentState {
        &self.context.indent
    }

    pub fn trace_flags(&self) -> &TraceFlags {
        &self.context.trace
    }

    fn appenders(&self) -> Result<Vec<Arc<dyn LogAppender>>> {
        Ok(self
            .context
            .appenders
            .read()
            .map_err(|_| anyhow!("appender list lock poisoned"))?
            .clone())
    }

    /// 记录日志，低于阈值的记录在格式化前丢弃
    pub fn log_record(&self, mut record: LogRecord) -> Result<()> {
        if !self.is_enabled_for(record.level) {
            return Ok(());
        }
        if record.name.is_empty() {
            record.name = self.name.clone();
        }
        self.emit(&record)
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let depth = self.context.indent.depth();
        let line = match self.formatter() {
            Some(formatter) => formatter.format(record, depth).unwrap_or_else(|err| {
                tracing::debug!(logger = %self.name, error = %err, "log record formatting failed");
                fallback_line(record, &err)
            }),
            None => fallback_line(record, &LogError::Config("no formatter".to_string())),
        };

        let mut result = Ok(());
        for appender in &self.appenders()? {
            if let Err(err) = appender.append(&line) {
                result = result.and(Err(err));
            }
        }
        result
    }

    /// 记录日志并开启缩进块：先输出，再将深度加一
    ///
    /// 即使记录被级别过滤，深度仍然会改变
    pub fn indent_record(&self, record: LogRecord) -> Result<()> {
        let result = self.log_record(record.with_indent(IndentMark::Start));
        self.context.indent.increment();
        result
    }

    /// 结束缩进块并记录日志：先将深度减一，再输出
    ///
    /// 深度已为 0 时保持 0，并额外输出一条 WARNING 记录
    pub fn unindent_record(&self, record: LogRecord) -> Result<()> {
        let warning = match self.context.indent.decrement() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(logger = %self.name, error = %err, "unbalanced unindent");
                self.log_record(LogRecord::new(Level::WARNING, "unbalanced unindent"))
            }
        };
        let result = self.log_record(record.with_indent(IndentMark::End));
        warning.and(result)
    }

    pub fn log(&self, level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(level.into_level()?, message))
    }

    /// 使用 `%` 风格参数记录日志
    pub fn logf<I>(&self, level: impl IntoLevel, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.log_record(LogRecord::new(level.into_level()?, message).with_args(args))
    }

    pub fn indent(&self, level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
        self.indent_record(LogRecord::new(level.into_level()?, message))
    }

    pub fn indentf<I>(&self, level: impl IntoLevel, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.indent_record(LogRecord::new(level.into_level()?, message).with_args(args))
    }

    pub fn unindent(&self, level: impl IntoLevel, message: impl Into<String>) -> Result<()> {
        self.unindent_record(LogRecord::new(level.into_level()?, message))
    }

    pub fn unindentf<I>(&self, level: impl IntoLevel, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.unindent_record(LogRecord::new(level.into_level()?, message).with_args(args))
    }

    /// 记录 TRACE 级别日志
    pub fn trace(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::TRACE, message))
    }

    /// 记录 DEBUG 级别日志
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::DEBUG, message))
    }

    /// 记录 INFO 级别日志
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::INFO, message))
    }

    /// 记录 WARNING 级别日志
    pub fn warning(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::WARNING, message))
    }

    /// 记录 ERROR 级别日志
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::ERROR, message))
    }

    /// 记录 CRITICAL 级别日志
    pub fn critical(&self, message: impl Into<String>) -> Result<()> {
        self.log_record(LogRecord::new(Level::CRITICAL, message))
    }

    pub fn tracef<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::TRACE, message, args)
    }

    pub fn debugf<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::DEBUG, message, args)
    }

    pub fn infof<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::INFO, message, args)
    }

    pub fn warningf<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::WARNING, message, args)
    }

    pub fn errorf<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::ERROR, message, args)
    }

    pub fn criticalf<I>(&self, message: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        self.logf(Level::CRITICAL, message, args)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("depth", &self.depth())
            .finish()
    }
}
