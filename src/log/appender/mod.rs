mod console_appender;
mod core;
mod file_appender;
mod memory_appender;
mod registry;

pub use console_appender::{ConsoleAppender, ConsoleAppenderConfig, Target};
pub use self::core::LogAppender;
pub use file_appender::{FileAppender, FileAppenderConfig};
pub use memory_appender::{strip_ansi, MemoryAppender, MemoryAppenderConfig};
pub use registry::{create_appender_from_options, register_appenders};
