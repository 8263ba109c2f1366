use crate::log::appender::LogAppender;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// MemoryAppender 配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct MemoryAppenderConfig {
    /// 最多保留的行数，超出后丢弃最早的行
    #[default = 10000]
    pub capacity: usize,
}

/// 内存输出器，保存最近输出的行
///
/// 克隆共享同一块缓冲区，可以一份交给 logger，一份留给调用方读取。
#[derive(Clone)]
pub struct MemoryAppender {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl MemoryAppender {
    pub fn new(config: MemoryAppenderConfig) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::new())),
            capacity: config.capacity.max(1),
        }
    }

    /// 已捕获的行（按输出顺序）
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 已捕获的行，去掉 ANSI 颜色序列
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines().iter().map(|line| strip_ansi(line)).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl Default for MemoryAppender {
    fn default() -> Self {
        Self::new(MemoryAppenderConfig::default())
    }
}

impl LogAppender for MemoryAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| anyhow!("memory appender lock poisoned"))?;
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(formatted_message.to_string());
        Ok(())
    }
}

/// 去掉 `ESC [ ... m` 形式的 SGR 序列
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}
