mod core;
mod indent_formatter;
mod interpolate;
mod style;
mod template;

pub use self::core::{fallback_line, LogFormatter};
pub use indent_formatter::{IndentConfig, IndentFormatter, IndentFormatterConfig, DEFAULT_TEMPLATE};
pub use interpolate::interpolate;
pub use style::{default_level_styles, parse_color, StyleConfig, TextStyle};
pub use template::Template;
