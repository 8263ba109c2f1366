use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 调用跟踪配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct TraceConfig {
    /// 是否跟踪函数（`#[ftrace]`、`Tracer::call`）
    #[default = true]
    #[garde(skip)]
    pub functions: bool,

    /// 是否跟踪类型方法（`#[ctrace]`、`Traced<T>`）
    #[default = true]
    #[garde(skip)]
    pub classes: bool,

    /// 参数展示的最大字符数，超出部分以 `...` 结尾
    #[default = 64]
    #[garde(range(min = 4, max = 4096))]
    pub max_arg_len: usize,
}

/// 跟踪开关，每次调用时读取
#[derive(Debug)]
pub struct TraceFlags {
    functions: AtomicBool,
    classes: AtomicBool,
    max_arg_len: AtomicUsize,
}

impl TraceFlags {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            functions: AtomicBool::new(config.functions),
            classes: AtomicBool::new(config.classes),
            max_arg_len: AtomicUsize::new(config.max_arg_len),
        }
    }

    pub fn functions(&self) -> bool {
        self.functions.load(Ordering::Relaxed)
    }

    pub fn set_functions(&self, enabled: bool) {
        self.functions.store(enabled, Ordering::Relaxed);
    }

    pub fn classes(&self) -> bool {
        self.classes.load(Ordering::Relaxed)
    }

    pub fn set_classes(&self, enabled: bool) {
        self.classes.store(enabled, Ordering::Relaxed);
    }

    pub fn max_arg_len(&self) -> usize {
        self.max_arg_len.load(Ordering::Relaxed)
    }

    pub fn set_max_arg_len(&self, len: usize) {
        self.max_arg_len.store(len.max(4), Ordering::Relaxed);
    }
}

impl Default for TraceFlags {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_toggle() {
        let flags = TraceFlags::default();
        assert!(flags.functions());
        assert!(flags.classes());

        flags.set_functions(false);
        flags.set_classes(false);
        assert!(!flags.functions());
        assert!(!flags.classes());
    }

    #[test]
    fn test_trace_config_validation() {
        let config = TraceConfig {
            max_arg_len: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(TraceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_max_arg_len_floor() {
        let flags = TraceFlags::default();
        flags.set_max_arg_len(0);
        assert_eq!(flags.max_arg_len(), 4);
    }
}
