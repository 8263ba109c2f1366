//! 跟踪记录中参数和返回值的展示
//!
//! 宏展开时类型已知，通过自动引用的方法解析顺序选择展示方式：
//! 实现了 `Debug` 的值按 `Debug` 输出，否则输出 `<TypeName>`。
//!
//! ```ignore
//! use cilog::trace::repr::{ViaDebug as _, ViaTypeName as _, Wrap};
//! let text = (&&Wrap(&value)).trace_arg(64);
//! ```

use std::fmt::Debug;

/// 值的借用包装，用于方法解析
pub struct Wrap<'a, T: ?Sized>(pub &'a T);

/// 调用结果：正常返回或以 `Err` 结束
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Returned(String),
    Raised(String),
}

pub trait ViaDebug {
    fn trace_arg(&self, max_len: usize) -> String;
}

impl<T: Debug + ?Sized> ViaDebug for &Wrap<'_, T> {
    fn trace_arg(&self, max_len: usize) -> String {
        truncate(&format!("{:?}", self.0), max_len)
    }
}

pub trait ViaTypeName {
    fn trace_arg(&self, max_len: usize) -> String;
}

impl<T: ?Sized> ViaTypeName for Wrap<'_, T> {
    fn trace_arg(&self, _max_len: usize) -> String {
        type_placeholder::<T>()
    }
}

pub trait OutcomeViaDebugResult {
    fn trace_outcome(&self, max_len: usize) -> Outcome;
}

impl<T: Debug, E: Debug> OutcomeViaDebugResult for &&&Wrap<'_, Result<T, E>> {
    fn trace_outcome(&self, max_len: usize) -> Outcome {
        let text = truncate(&format!("{:?}", self.0), max_len);
        match self.0 {
            Ok(_) => Outcome::Returned(text),
            Err(_) => Outcome::Raised(text),
        }
    }
}

pub trait OutcomeViaResult {
    fn trace_outcome(&self, max_len: usize) -> Outcome;
}

impl<T, E> OutcomeViaResult for &&Wrap<'_, Result<T, E>> {
    fn trace_outcome(&self, _max_len: usize) -> Outcome {
        match self.0 {
            Ok(_) => Outcome::Returned(format!("Ok({})", type_placeholder::<T>())),
            Err(_) => Outcome::Raised(format!("Err({})", type_placeholder::<E>())),
        }
    }
}

pub trait OutcomeViaDebug {
    fn trace_outcome(&self, max_len: usize) -> Outcome;
}

impl<T: Debug + ?Sized> OutcomeViaDebug for &Wrap<'_, T> {
    fn trace_outcome(&self, max_len: usize) -> Outcome {
        Outcome::Returned(truncate(&format!("{:?}", self.0), max_len))
    }
}

pub trait OutcomeViaTypeName {
    fn trace_outcome(&self, max_len: usize) -> Outcome;
}

impl<T: ?Sized> OutcomeViaTypeName for Wrap<'_, T> {
    fn trace_outcome(&self, _max_len: usize) -> Outcome {
        Outcome::Returned(type_placeholder::<T>())
    }
}

/// 超过 `max_len` 个字符时截断并以 `...` 结尾
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// `<TypeName>` 形式的占位展示
pub fn type_placeholder<T: ?Sized>() -> String {
    format!("<{}>", short_type_name::<T>())
}

/// 去掉路径前缀的类型名：`alloc::vec::Vec<app::User>` -> `Vec<User>`
pub fn short_type_name<T: ?Sized>() -> String {
    simplify_type_name(std::any::type_name::<T>())
}

fn simplify_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment = String::new();
    for c in full_name.chars() {
        if matches!(c, '<' | '>' | ',' | '(' | ')' | '[' | ']' | '&' | ';' | ' ' | '*') {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(c);
        } else {
            segment.push(c);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// 去掉泛型参数的完整类型路径，作为 logger 名称：`app::model::Account`
pub fn type_path<T: ?Sized>() -> &'static str {
    let full_name = std::any::type_name::<T>();
    full_name.split('<').next().unwrap_or(full_name)
}
