use crate::log::appender::LogAppender;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// FileAppender 配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FileAppenderConfig {
    /// 日志文件路径
    pub file_path: String,
}

/// 文件输出器
///
/// 以追加方式写入，父目录不存在时自动创建
pub struct FileAppender {
    writer: Mutex<BufWriter<File>>,
    config: FileAppenderConfig,
}

impl FileAppender {
    pub fn new(config: FileAppenderConfig) -> Result<Self> {
        let path = PathBuf::from(&config.file_path);

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            config,
        })
    }

    /// 获取日志文件路径
    pub fn path(&self) -> &str {
        &self.config.file_path
    }
}

impl LogAppender for FileAppender {
    fn append(&self, formatted_message: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("file appender lock poisoned"))?;
        writer.write_all(formatted_message.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("file appender lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}

crate::impl_try_from!(FileAppenderConfig => FileAppender);
crate::impl_box_from!(FileAppender => dyn LogAppender);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appender_append() -> Result<()> {
        let temp_file = tempfile::NamedTempFile::new()?;
        let appender = FileAppender::new(FileAppenderConfig {
            file_path: temp_file.path().to_string_lossy().to_string(),
        })?;

        appender.append("First message")?;
        appender.append("Second message")?;
        appender.flush()?;

        let contents = std::fs::read_to_string(temp_file.path())?;
        assert_eq!(contents, "First message\nSecond message\n");
        assert_eq!(appender.path(), temp_file.path().to_string_lossy());
        Ok(())
    }

    #[test]
    fn test_file_appender_creates_directory() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let log_path = temp_dir.path().join("nested").join("dir").join("test.log");

        let appender = FileAppender::try_from(FileAppenderConfig {
            file_path: log_path.to_string_lossy().to_string(),
        })?;
        appender.append("Test")?;

        assert!(log_path.exists());
        Ok(())
    }

    #[test]
    fn test_file_appender_open_error() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        // 路径本身是目录，无法作为文件打开
        let result = FileAppender::new(FileAppenderConfig {
            file_path: temp_dir.path().to_string_lossy().to_string(),
        });
        assert!(result.is_err());
        Ok(())
    }
}
