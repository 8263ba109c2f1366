use thiserror::Error;

/// 日志模块统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("未知日志级别: {0}")]
    UnknownLevel(String),

    #[error("日志级别冲突: {name}={value} 与已注册的 {existing} 冲突")]
    ConflictingLevel {
        name: String,
        value: u16,
        existing: String,
    },

    #[error("格式化错误: {0}")]
    Format(String),

    #[error("缩进不平衡: 深度已为 0 时调用 unindent")]
    ImbalancedIndent,

    #[error("配置错误: {0}")]
    Config(String),
}

pub type LogResult<T> = std::result::Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(LogError::UnknownLevel("VERBOSE".to_string())
            .to_string()
            .contains("VERBOSE"));

        let err = LogError::ConflictingLevel {
            name: "TRACE".to_string(),
            value: 7,
            existing: "TRACE=5".to_string(),
        };
        assert!(err.to_string().contains("TRACE=7"));
        assert!(err.to_string().contains("TRACE=5"));
    }

    #[test]
    fn test_error_into_anyhow() {
        let err: anyhow::Error = LogError::ImbalancedIndent.into();
        assert_eq!(
            err.downcast_ref::<LogError>(),
            Some(&LogError::ImbalancedIndent)
        );
    }
}
