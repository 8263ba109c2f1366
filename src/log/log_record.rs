use crate::log::level::Level;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

/// 插值参数值，支持多种类型
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Null,
    /// 只能以 `Debug` 形式展示的值
    Repr(String),
}

impl Serialize for ArgValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ArgValue::String(s) => serializer.serialize_str(s),
            ArgValue::I64(n) => serializer.serialize_i64(*n),
            ArgValue::U64(n) => serializer.serialize_u64(*n),
            ArgValue::F64(n) => serializer.serialize_f64(*n),
            ArgValue::Bool(b) => serializer.serialize_bool(*b),
            ArgValue::Null => serializer.serialize_none(),
            ArgValue::Repr(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::String(s) => write!(f, "{}", s),
            ArgValue::I64(n) => write!(f, "{}", n),
            ArgValue::U64(n) => write!(f, "{}", n),
            ArgValue::F64(n) => write!(f, "{}", n),
            ArgValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            ArgValue::Null => write!(f, "None"),
            ArgValue::Repr(s) => write!(f, "{}", s),
        }
    }
}

impl ArgValue {
    /// 从任意 `Debug` 值创建
    pub fn repr<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        ArgValue::Repr(format!("{:?}", value))
    }

    /// `%r` 使用的展示形式：字符串带引号，其余同 Display
    pub fn to_repr(&self) -> String {
        match self {
            ArgValue::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

// 为各种类型实现 From<T> for ArgValue 以方便使用
impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::String(s)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<&String> for ArgValue {
    fn from(s: &String) -> Self {
        ArgValue::String(s.clone())
    }
}

impl From<char> for ArgValue {
    fn from(c: char) -> Self {
        ArgValue::String(c.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::I64(n)
    }
}

impl From<i32> for ArgValue {
    fn from(n: i32) -> Self {
        ArgValue::I64(n as i64)
    }
}

impl From<i16> for ArgValue {
    fn from(n: i16) -> Self {
        ArgValue::I64(n as i64)
    }
}

impl From<i8> for ArgValue {
    fn from(n: i8) -> Self {
        ArgValue::I64(n as i64)
    }
}

impl From<isize> for ArgValue {
    fn from(n: isize) -> Self {
        ArgValue::I64(n as i64)
    }
}

impl From<u64> for ArgValue {
    fn from(n: u64) -> Self {
        ArgValue::U64(n)
    }
}

impl From<u32> for ArgValue {
    fn from(n: u32) -> Self {
        ArgValue::U64(n as u64)
    }
}

impl From<u16> for ArgValue {
    fn from(n: u16) -> Self {
        ArgValue::U64(n as u64)
    }
}

impl From<u8> for ArgValue {
    fn from(n: u8) -> Self {
        ArgValue::U64(n as u64)
    }
}

impl From<usize> for ArgValue {
    fn from(n: usize) -> Self {
        ArgValue::U64(n as u64)
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        ArgValue::F64(n)
    }
}

impl From<f32> for ArgValue {
    fn from(n: f32) -> Self {
        ArgValue::F64(n as f64)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ArgValue::Null)
    }
}

/// 记录在缩进块中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentMark {
    /// 普通记录
    #[default]
    Default,
    /// 开启缩进块的记录（indent）
    Start,
    /// 结束缩进块的记录（unindent）
    End,
}

/// 属性访问器类型，用于区分 getter / setter 的填充标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Getter,
    Setter,
}

/// 日志记录
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 日志级别
    pub level: Level,
    /// logger 名称
    pub name: String,
    /// 消息模板
    pub message: String,
    /// 插值参数，为空时消息原样输出
    pub args: Vec<ArgValue>,
    /// 时间戳
    pub timestamp: DateTime<Local>,
    /// 线程 ID（已缓存的字符串表示）
    pub thread_id: String,
    /// 被跟踪的函数名
    pub func_name: Option<String>,
    /// 缩进块位置
    pub indent: IndentMark,
    /// 属性访问器标记
    pub accessor: Option<Accessor>,
    /// 函数名与消息之间的前缀，`None` 时使用格式化器的默认值
    pub prefix: Option<String>,
    /// 源文件路径
    pub file: Option<String>,
    /// 行号
    pub line: Option<u32>,
}

impl LogRecord {
    /// 创建新的日志记录
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            name: String::new(),
            message: message.into(),
            args: Vec::new(),
            timestamp: Local::now(),
            thread_id: format!("{:?}", std::thread::current().id()),
            func_name: None,
            indent: IndentMark::Default,
            accessor: None,
            prefix: None,
            file: None,
            line: None,
        }
    }

    /// 设置 logger 名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 添加插值参数
    pub fn with_arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// 设置全部插值参数
    pub fn with_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ArgValue>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// 设置被跟踪的函数名
    pub fn with_func_name(mut self, func_name: impl Into<String>) -> Self {
        self.func_name = Some(func_name.into());
        self
    }

    pub fn with_indent(mut self, indent: IndentMark) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// 设置位置信息（文件和行号）
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}
