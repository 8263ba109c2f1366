use crate::cfg::{create_trait_from_type_options, register_trait, TypeOptions};
use crate::log::appender::LogAppender;
use crate::log::appender::{
    console_appender::{ConsoleAppender, ConsoleAppenderConfig},
    file_appender::{FileAppender, FileAppenderConfig},
};
use anyhow::Result;

/// 注册可以从配置创建的 Appender 实现
///
/// `MemoryAppender` 不在其中：配置创建的实例没有人能读到缓冲区，只能通过
/// `LoggerManager::add_appender` 挂载。
pub fn register_appenders() -> Result<()> {
    register_trait::<ConsoleAppender, dyn LogAppender, ConsoleAppenderConfig>("ConsoleAppender")?;
    register_trait::<FileAppender, dyn LogAppender, FileAppenderConfig>("FileAppender")?;
    Ok(())
}

/// 从 TypeOptions 创建 Appender
pub fn create_appender_from_options(options: &TypeOptions) -> Result<Box<dyn LogAppender>> {
    create_trait_from_type_options(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_console_appender() -> Result<()> {
        register_appenders()?;

        let opts = TypeOptions::from_json(
            r#"
            {
                "type": "ConsoleAppender",
                "options": {
                    "target": "stdout",
                    "auto_flush": true
                }
            }
        "#,
        )?;

        let appender = create_appender_from_options(&opts)?;
        assert!(appender.append("test message").is_ok());
        Ok(())
    }

    #[test]
    fn test_create_file_appender() -> Result<()> {
        register_appenders()?;

        let temp_file = tempfile::NamedTempFile::new()?;
        let opts = TypeOptions::new(
            "FileAppender",
            serde_json::json!({ "file_path": temp_file.path().to_string_lossy() }),
        );

        let appender = create_appender_from_options(&opts)?;
        appender.append("test message")?;
        appender.flush()?;
        assert_eq!(std::fs::read_to_string(temp_file.path())?, "test message\n");
        Ok(())
    }

    #[test]
    fn test_memory_appender_not_configurable() -> Result<()> {
        register_appenders()?;

        let opts = TypeOptions::from_json(r#"{ type: "MemoryAppender" }"#)?;
        assert!(create_appender_from_options(&opts).is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_appender() -> Result<()> {
        register_appenders()?;

        let opts = TypeOptions::from_json(r#"{ type: "KafkaAppender", options: {} }"#)?;
        assert!(create_appender_from_options(&opts).is_err());
        Ok(())
    }

    #[test]
    fn test_file_appender_missing_path() -> Result<()> {
        register_appenders()?;

        let opts = TypeOptions::from_json(r#"{ type: "FileAppender", options: {} }"#)?;
        assert!(create_appender_from_options(&opts).is_err());
        Ok(())
    }
}
