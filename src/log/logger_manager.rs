use crate::cfg::TypeOptions;
use crate::log::appender::{create_appender_from_options, register_appenders, LogAppender};
use crate::log::formatter::{IndentFormatter, IndentFormatterConfig, LogFormatter};
use crate::log::level::Level;
use crate::log::logger::{Logger, LoggerContext};
use crate::trace::{TraceConfig, TraceFlags};
use anyhow::{anyhow, Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::HashMap;
use std::sync::{Arc, Once, RwLock};

/// 根 logger 的名称
pub const ROOT_LOGGER_NAME: &str = "root";

/// 单个 logger 的覆盖配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOverride {
    /// 阈值，未设置时继承父 logger
    pub level: Option<Level>,

    /// 级别名称 -> 模板，只作用于该 logger 及其未覆盖的子 logger
    pub templates: HashMap<String, String>,
}

/// Logger Manager 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct LoggerManagerConfig {
    /// 根 logger 的阈值
    #[default(Level::WARNING)]
    #[garde(skip)]
    pub level: Level,

    #[garde(dive)]
    pub formatter: IndentFormatterConfig,

    /// 输出器列表
    #[default(vec![TypeOptions::new("ConsoleAppender", serde_json::json!({}))])]
    #[garde(skip)]
    pub appenders: Vec<TypeOptions>,

    /// logger 名称 -> 覆盖配置
    #[garde(skip)]
    pub loggers: HashMap<String, LoggerOverride>,

    #[garde(dive)]
    pub trace: TraceConfig,
}

impl LoggerManagerConfig {
    /// 从 JSON 字符串创建（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(json5::from_str(json_str)?)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// 注册所有日志组件（只执行一次）
static REGISTER_ONCE: Once = Once::new();

/// Logger 管理器
///
/// 维护一棵以 `root` 为根的 logger 树。同名 logger 只创建一次，
/// 树中所有 logger 共享输出器、缩进深度和跟踪开关。
pub struct LoggerManager {
    root: Arc<Logger>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    overrides: HashMap<String, (Option<Level>, Option<Arc<dyn LogFormatter>>)>,
    context: Arc<LoggerContext>,
}

impl LoggerManager {
    /// 从配置创建 LoggerManager
    pub fn new(config: LoggerManagerConfig) -> Result<Self> {
        REGISTER_ONCE.call_once(|| {
            if let Err(err) = register_appenders() {
                tracing::error!(error = %err, "failed to register appenders");
            }
        });

        config.validate()?;

        let formatter = IndentFormatter::new(config.formatter.clone())?;

        // 模板覆盖在构造时编译，未知级别名称直接报错
        let mut overrides = HashMap::new();
        for (name, logger_override) in &config.loggers {
            let formatter: Option<Arc<dyn LogFormatter>> = if logger_override.templates.is_empty() {
                None
            } else {
                Some(Arc::new(formatter.with_templates(&logger_override.templates)?))
            };
            overrides.insert(normalize_name(name), (logger_override.level, formatter));
        }

        let appenders = config
            .appenders
            .iter()
            .map(|options| create_appender_from_options(options).map(Arc::<dyn LogAppender>::from))
            .collect::<Result<Vec<_>>>()?;

        let context = Arc::new(LoggerContext::new(appenders, TraceFlags::new(&config.trace)));
        let root = Arc::new(Logger::root(
            ROOT_LOGGER_NAME,
            config.level,
            Arc::new(formatter),
            Arc::clone(&context),
        ));

        let manager = Self {
            root,
            loggers: RwLock::new(HashMap::new()),
            overrides,
            context,
        };
        manager.apply_override(ROOT_LOGGER_NAME, &manager.root);
        Ok(manager)
    }

    fn apply_override(&self, name: &str, logger: &Logger) {
        if let Some((level, formatter)) = self.overrides.get(name) {
            if let Some(level) = level {
                // 级别已在反序列化时校验
                let _ = logger.set_level(*level);
            }
            if let Some(formatter) = formatter {
                logger.set_formatter(Arc::clone(formatter));
            }
        }
    }

    /// 从 JSON5 配置字符串创建
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config = LoggerManagerConfig::from_json(json_str)
            .map_err(|err| anyhow!("invalid logger manager config: {}", err))?;
        Self::new(config)
    }

    /// 根 logger
    pub fn root_logger(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    /// 获取（必要时创建）指定名称的 logger
    ///
    /// `::` 和 `.` 都作为层级分隔符；空名称和 `root` 返回根 logger。
    /// 父 logger 会一并创建，子 logger 的阈值沿父链继承。
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let name = normalize_name(name);
        if name.is_empty() || name == ROOT_LOGGER_NAME {
            return self.root_logger();
        }

        if let Some(logger) = self.loggers.read().ok().and_then(|loggers| loggers.get(&name).cloned()) {
            return logger;
        }

        let parent = match name.rsplit_once("::") {
            Some((parent, _)) => self.get_logger(parent),
            None => self.root_logger(),
        };

        let logger = Arc::new(Logger::child(&parent, name.clone()));
        self.apply_override(&name, &logger);

        match self.loggers.write() {
            Ok(mut loggers) => Arc::clone(loggers.entry(name).or_insert(logger)),
            Err(_) => logger,
        }
    }

    /// 检查指定名称的 logger 是否已创建
    pub fn contains(&self, name: &str) -> bool {
        let name = normalize_name(name);
        name == ROOT_LOGGER_NAME
            || self
                .loggers
                .read()
                .map(|loggers| loggers.contains_key(&name))
                .unwrap_or(false)
    }

    /// 已创建的 logger 名称（不含 root，排序后）
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .read()
            .map(|loggers| loggers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// 运行时追加输出器
    pub fn add_appender(&self, appender: Arc<dyn LogAppender>) -> Result<()> {
        self.root.add_appender(appender)
    }

    /// 刷新所有输出器
    pub fn flush(&self) -> Result<()> {
        self.root.flush()
    }

    pub fn trace_flags(&self) -> &TraceFlags {
        &self.context.trace
    }

    pub fn set_function_tracing(&self, enabled: bool) {
        self.context.trace.set_functions(enabled);
    }

    pub fn set_class_tracing(&self, enabled: bool) {
        self.context.trace.set_classes(enabled);
    }

    /// 当前缩进深度
    pub fn depth(&self) -> usize {
        self.context.indent.depth()
    }
}

impl TryFrom<LoggerManagerConfig> for LoggerManager {
    type Error = anyhow::Error;

    fn try_from(config: LoggerManagerConfig) -> Result<Self> {
        Self::new(config)
    }
}

/// 统一层级分隔符为 `::`，去掉首尾分隔符
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .replace('.', "::")
        .trim_matches(':')
        .to_string()
}

impl std::fmt::Debug for LoggerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerManager")
            .field("root", &self.root)
            .field("loggers", &self.logger_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::MemoryAppender;
    use crate::log::error::LogError;

    fn memory_manager(config: &str) -> Result<(LoggerManager, MemoryAppender)> {
        let manager = LoggerManager::from_json(config)?;
        let memory = MemoryAppender::default();
        manager.add_appender(Arc::new(memory.clone()))?;
        Ok((manager, memory))
    }

    #[test]
    fn test_default_config() {
        let config = LoggerManagerConfig::default();
        assert_eq!(config.level, Level::WARNING);
        assert_eq!(config.appenders.len(), 1);
        assert_eq!(config.appenders[0].type_name, "ConsoleAppender");
        assert!(config.formatter.colored);
        assert!(config.trace.functions);
    }

    #[test]
    fn test_get_logger_cached() -> Result<()> {
        let (manager, _) = memory_manager(r#"{ appenders: [] }"#)?;
        let a = manager.get_logger("app::db");
        let b = manager.get_logger("app.db");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(manager.contains("app"));
        assert_eq!(manager.logger_names(), vec!["app", "app::db"]);
        assert!(Arc::ptr_eq(&manager.get_logger(""), &manager.root_logger()));
        Ok(())
    }

    #[test]
    fn test_hierarchy_threshold() -> Result<()> {
        let (manager, memory) = memory_manager(
            r#"{
                level: "warning",
                appenders: [],
                formatter: { colored: false, default_template: "{levelname} {name} {message}" },
                loggers: { "app.db": { level: "debug" } },
            }"#,
        )?;

        manager.get_logger("app::db::pool").debug("inherited")?;
        manager.get_logger("app").debug("dropped")?;
        manager.get_logger("other").warning("kept")?;

        assert_eq!(
            memory.lines(),
            vec!["DEBUG app::db::pool inherited", "WARNING other kept"]
        );
        Ok(())
    }

    #[test]
    fn test_per_logger_templates() -> Result<()> {
        let (manager, memory) = memory_manager(
            r#"{
                level: "trace",
                appenders: [],
                formatter: { colored: false, default_template: "{message}" },
                loggers: { audit: { templates: { info: "AUDIT {message}" } } },
            }"#,
        )?;

        manager.get_logger("audit::login").info("ok")?;
        manager.get_logger("web").info("ok")?;
        assert_eq!(memory.lines(), vec!["AUDIT ok", "ok"]);
        Ok(())
    }

    #[test]
    fn test_unknown_template_key_rejected() {
        let err = LoggerManager::from_json(
            r#"{ appenders: [], formatter: { templates: { LOUD: "{message}" } } }"#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LogError>(),
            Some(&LogError::UnknownLevel("LOUD".to_string()))
        );

        let err = LoggerManager::from_json(
            r#"{ appenders: [], loggers: { app: { templates: { shout: "{message}" } } } }"#,
        )
        .unwrap_err();
        assert!(err.downcast_ref::<LogError>().is_some());
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(LoggerManager::from_json(r#"{ level: "chatty" }"#).is_err());
    }

    #[test]
    fn test_invalid_indent_step_rejected() {
        assert!(LoggerManager::from_json(r#"{ appenders: [], formatter: { indent: { step: 0 } } }"#).is_err());
    }

    #[test]
    fn test_shared_indent_depth() -> Result<()> {
        let (manager, _) = memory_manager(r#"{ appenders: [] }"#)?;
        let a = manager.get_logger("a");
        let b = manager.get_logger("b");
        a.indent(Level::TRACE, "enter")?;
        assert_eq!(b.depth(), 1);
        b.unindent(Level::TRACE, "leave")?;
        assert_eq!(manager.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_trace_toggles() -> Result<()> {
        let (manager, _) = memory_manager(r#"{ appenders: [], trace: { classes: false } }"#)?;
        assert!(manager.trace_flags().functions());
        assert!(!manager.trace_flags().classes());
        manager.set_function_tracing(false);
        manager.set_class_tracing(true);
        assert!(!manager.get_logger("x").trace_flags().functions());
        assert!(manager.get_logger("x").trace_flags().classes());
        Ok(())
    }

    #[test]
    fn test_yaml_and_toml_config() -> Result<()> {
        let config = LoggerManagerConfig::from_yaml(
            r#"
level: debug
formatter:
  colored: false
appenders:
  - type: ConsoleAppender
    options:
      target: stderr
"#,
        )?;
        assert_eq!(config.level, Level::DEBUG);
        assert!(LoggerManager::try_from(config).is_ok());

        let config = LoggerManagerConfig::from_toml(
            r#"
level = "info"

[trace]
max_arg_len = 16
"#,
        )?;
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.trace.max_arg_len, 16);
        Ok(())
    }

    #[test]
    fn test_file_appender_from_config() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("app.log");
        let config = LoggerManagerConfig {
            level: Level::INFO,
            formatter: IndentFormatterConfig {
                colored: false,
                default_template: "{levelname} {message}".to_string(),
                ..Default::default()
            },
            appenders: vec![TypeOptions::new(
                "FileAppender",
                serde_json::json!({ "file_path": path.to_string_lossy() }),
            )],
            ..Default::default()
        };
        let manager = LoggerManager::new(config)?;
        manager.get_logger("file").info("persisted")?;
        manager.flush()?;
        assert_eq!(std::fs::read_to_string(&path)?, "INFO persisted\n");
        Ok(())
    }
}
