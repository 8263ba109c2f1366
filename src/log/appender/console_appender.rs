use crate::log::appender::LogAppender;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::io::{self, Write};

/// 输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Stdout,
    #[default]
    Stderr,
}

/// ConsoleAppender 配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct ConsoleAppenderConfig {
    /// 输出到 stdout 还是 stderr
    pub target: Target,

    /// 每行输出后是否立即刷新
    #[default = true]
    pub auto_flush: bool,
}

/// 终端输出器
pub struct ConsoleAppender {
    config: ConsoleAppenderConfig,
}

impl ConsoleAppender {
    pub fn new(config: ConsoleAppenderConfig) -> Self {
        Self { config }
    }

    pub fn target(&self) -> Target {
        self.config.target
    }

    fn write_line(&self, out: &mut dyn Write, message: &str) -> io::Result<()> {
        writeln!(out, "{}", message)?;
        if self.config.auto_flush {
            out.flush()?;
        }
        Ok(())
    }
}

impl LogAppender for ConsoleAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        match self.config.target {
            Target::Stdout => self.write_line(&mut io::stdout().lock(), formatted_message)?,
            Target::Stderr => self.write_line(&mut io::stderr().lock(), formatted_message)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.config.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}

impl From<ConsoleAppenderConfig> for ConsoleAppender {
    fn from(config: ConsoleAppenderConfig) -> Self {
        Self::new(config)
    }
}

crate::impl_box_from!(ConsoleAppender => dyn LogAppender);
