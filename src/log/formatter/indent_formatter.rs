use crate::log::error::{LogError, LogResult};
use crate::log::formatter::style::{default_level_styles, StyleConfig, TextStyle};
use crate::log::formatter::template::{FieldValues, Template};
use crate::log::formatter::{interpolate, LogFormatter};
use crate::log::level::{self, Level};
use crate::log::log_record::{Accessor, IndentMark, LogRecord};
use chrono::format::{Item, StrftimeItems};
use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::HashMap;

/// 默认模板：时间、级别、名称、缩进、函数名、消息
pub const DEFAULT_TEMPLATE: &str = "<color fg=cyan>{asctime:12s}</> <level>{levelname: >8s}</> <color fg=green>{name: >35s}:</> <color fg=grey bg=#414141>{padding}</><color fg=magenta>{funcName}</>{prefix}<level>{message}</>";

/// 缩进填充配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct IndentConfig {
    /// 每层缩进的宽度
    #[default = 2]
    #[garde(range(min = 1, max = 16))]
    pub step: usize,

    #[default = ' ']
    #[garde(skip)]
    pub default_fill: char,

    #[default = "  "]
    #[garde(length(max = 8))]
    pub default_enclosure: String,

    #[default = '-']
    #[garde(skip)]
    pub start_fill: char,

    #[default = ">"]
    #[garde(length(max = 8))]
    pub start_enclosure: String,

    #[default = '-']
    #[garde(skip)]
    pub end_fill: char,

    #[default = "<"]
    #[garde(length(max = 8))]
    pub end_enclosure: String,

    /// getter 记录替换边界字符
    #[default = "#"]
    #[garde(length(max = 8))]
    pub getter_enclosure: String,

    /// setter 记录替换边界字符
    #[default = "@"]
    #[garde(length(max = 8))]
    pub setter_enclosure: String,
}

/// IndentFormatter 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct IndentFormatterConfig {
    /// 是否输出 ANSI 颜色，关闭时颜色标记被剥离
    #[default = true]
    #[garde(skip)]
    pub colored: bool,

    /// 未单独配置的级别使用的模板
    #[default(DEFAULT_TEMPLATE.to_string())]
    #[garde(length(min = 1))]
    pub default_template: String,

    /// 级别名称 -> 模板
    #[garde(skip)]
    pub templates: HashMap<String, String>,

    /// 级别名称 -> 样式，覆盖默认样式表中的同名项
    #[garde(skip)]
    pub level_styles: HashMap<String, StyleConfig>,

    #[garde(dive)]
    pub indent: IndentConfig,

    /// 有函数名时函数名与消息之间的分隔
    #[default = ": "]
    #[garde(skip)]
    pub prefix: String,

    /// `{asctime}` 的 chrono 格式
    #[default = "%Y-%m-%d %H:%M:%S,%3f"]
    #[garde(length(min = 1))]
    pub date_format: String,
}

/// 缩进感知的格式化器
///
/// 模板在构造时编译；每条记录按级别选择模板，渲染缩进填充和颜色。
#[derive(Debug, Clone)]
pub struct IndentFormatter {
    config: IndentFormatterConfig,
    default_template: Template,
    templates: HashMap<Level, Template>,
    level_styles: HashMap<Level, TextStyle>,
}

impl IndentFormatter {
    pub fn new(config: IndentFormatterConfig) -> LogResult<Self> {
        config
            .validate()
            .map_err(|report| LogError::Config(report.to_string()))?;

        let default_template = Template::parse(&config.default_template)?;
        let templates = compile_templates(&config.templates)?;

        if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(LogError::Config(format!(
                "invalid date format '{}'",
                config.date_format
            )));
        }

        // 先展开默认样式，再按解析后的级别覆盖，避免大小写不同的同名键互相冲突
        let mut level_styles = HashMap::new();
        for styles in [&default_level_styles(), &config.level_styles] {
            for (name, style) in styles {
                level_styles.insert(level::resolve_name(name)?, TextStyle::from_config(style));
            }
        }

        Ok(Self {
            config,
            default_template,
            templates,
            level_styles,
        })
    }

    pub fn config(&self) -> &IndentFormatterConfig {
        &self.config
    }

    /// 返回附加了额外模板的新格式化器，用于单个 logger 的模板覆盖
    pub fn with_templates(&self, overrides: &HashMap<String, String>) -> LogResult<Self> {
        let mut formatter = self.clone();
        formatter.templates.extend(compile_templates(overrides)?);
        for (name, template) in overrides {
            formatter
                .config
                .templates
                .insert(name.clone(), template.clone());
        }
        Ok(formatter)
    }

    fn template_for(&self, level: Level) -> &Template {
        self.templates.get(&level).unwrap_or(&self.default_template)
    }

    /// 渲染缩进填充
    pub fn padding(&self, record: &LogRecord, depth: usize) -> String {
        let indent = &self.config.indent;
        let width = depth * indent.step;
        let accessor = record.accessor.map(|accessor| match accessor {
            Accessor::Getter => indent.getter_enclosure.as_str(),
            Accessor::Setter => indent.setter_enclosure.as_str(),
        });

        match record.indent {
            IndentMark::Default => {
                let mut padding: String = std::iter::repeat(indent.default_fill).take(width).collect();
                padding.push_str(accessor.unwrap_or(&indent.default_enclosure));
                padding
            }
            IndentMark::Start => {
                let mut padding: String = std::iter::repeat(indent.start_fill).take(width).collect();
                padding.push_str(accessor.unwrap_or(&indent.start_enclosure));
                padding
            }
            IndentMark::End => {
                let mut padding = accessor.unwrap_or(&indent.end_enclosure).to_string();
                padding.extend(std::iter::repeat(indent.end_fill).take(width));
                padding
            }
        }
    }
}

fn compile_templates(templates: &HashMap<String, String>) -> LogResult<HashMap<Level, Template>> {
    templates
        .iter()
        .map(|(name, source)| Ok((level::resolve_name(name)?, Template::parse(source)?)))
        .collect()
}

impl LogFormatter for IndentFormatter {
    fn format(&self, record: &LogRecord, depth: usize) -> Result<String, LogError> {
        let message = interpolate(&record.message, &record.args)?;
        let padding = self.padding(record, depth);
        let func_name = record.func_name.as_deref().unwrap_or("");
        let prefix = match (&record.prefix, &record.func_name) {
            (Some(prefix), _) => prefix.as_str(),
            (None, Some(_)) => self.config.prefix.as_str(),
            (None, None) => "",
        };

        let values = FieldValues {
            asctime: record.timestamp.format(&self.config.date_format).to_string(),
            level_name: record.level.name(),
            level_no: record.level.value(),
            name: &record.name,
            message: &message,
            padding: &padding,
            func_name,
            prefix,
            thread: &record.thread_id,
            file: record.file.as_deref().unwrap_or(""),
            line: record.line,
        };

        let plain = TextStyle::default();
        let level_style = self
            .config
            .colored
            .then(|| self.level_styles.get(&record.level).unwrap_or(&plain));

        let mut out = String::with_capacity(message.len() + padding.len() + 96);
        self.template_for(record.level)
            .render(&values, level_style, &mut out);
        Ok(out)
    }
}
