use colored::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 样式配置（与模板中 `<color fg=.. bg=.. style=..>` 的属性一致）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub style: Option<String>,
}

impl StyleConfig {
    fn new(fg: Option<&str>, bg: Option<&str>, style: Option<&str>) -> Self {
        Self {
            fg: fg.map(str::to_string),
            bg: bg.map(str::to_string),
            style: style.map(str::to_string),
        }
    }
}

/// 解析后的文本样式
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    fg: Option<Color>,
    bg: Option<Color>,
    attrs: Vec<u8>,
}

impl TextStyle {
    pub fn from_config(config: &StyleConfig) -> Self {
        Self {
            fg: config.fg.as_deref().and_then(parse_color),
            bg: config.bg.as_deref().and_then(parse_color),
            attrs: config.style.as_deref().map(parse_attrs).unwrap_or_default(),
        }
    }

    /// 解析 `fg=cyan bg=#414141 style=bold` 形式的属性串
    pub fn from_attributes(attributes: &str) -> Self {
        let mut config = StyleConfig::default();
        for pair in attributes.split_whitespace() {
            match pair.split_once('=') {
                Some(("fg", value)) => config.fg = Some(value.to_string()),
                Some(("bg", value)) => config.bg = Some(value.to_string()),
                Some(("style", value)) => config.style = Some(value.to_string()),
                _ => tracing::warn!(attribute = pair, "ignored unknown color attribute"),
            }
        }
        Self::from_config(&config)
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    /// ANSI SGR 起始序列，无样式时为空串
    pub fn prefix(&self) -> String {
        if self.is_plain() {
            return String::new();
        }
        let mut codes: Vec<String> = self.attrs.iter().map(u8::to_string).collect();
        if let Some(fg) = &self.fg {
            codes.push(color_code(fg, false));
        }
        if let Some(bg) = &self.bg {
            codes.push(color_code(bg, true));
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// 用样式包裹文本
    pub fn paint(&self, text: &str, out: &mut String) {
        if self.is_plain() || text.is_empty() {
            out.push_str(text);
            return;
        }
        out.push_str(&self.prefix());
        out.push_str(text);
        out.push_str(RESET);
    }
}

pub const RESET: &str = "\x1b[0m";

/// 颜色的 SGR 参数，`TrueColor` 固定输出 24 位序列，不随终端能力降级
fn color_code(color: &Color, background: bool) -> String {
    match color {
        Color::TrueColor { r, g, b } => {
            format!("{};2;{};{};{}", if background { 48 } else { 38 }, r, g, b)
        }
        _ if background => color.to_bg_str().into_owned(),
        _ => color.to_fg_str().into_owned(),
    }
}

/// 解析颜色：ANSI 名称、扩展名称或 `#rrggbb`
pub fn parse_color(name: &str) -> Option<Color> {
    let name = name.trim().to_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some((r, g, b)) = named_rgb(&name) {
        return Some(Color::TrueColor { r, g, b });
    }
    match name.replace('_', " ").parse::<Color>() {
        Ok(color) => Some(color),
        Err(_) => {
            tracing::warn!(color = %name, "ignored unknown color");
            None
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Color::TrueColor {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// ANSI 十六色之外的常用颜色名称
fn named_rgb(name: &str) -> Option<(u8, u8, u8)> {
    let rgb = match name {
        "turquoise" => (64, 224, 208),
        "orange" => (255, 165, 0),
        "tomato" => (255, 99, 71),
        "brown" => (165, 42, 42),
        "grey" | "gray" => (128, 128, 128),
        "pink" => (255, 192, 203),
        "purple" => (128, 0, 128),
        "gold" => (255, 215, 0),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "olive" => (128, 128, 0),
        "silver" => (192, 192, 192),
        _ => return None,
    };
    Some(rgb)
}

fn parse_attrs(spec: &str) -> Vec<u8> {
    spec.split(|c| c == '+' || c == ',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|attr| {
            let code = match attr.trim().to_lowercase().as_str() {
                "bold" => 1,
                "dim" | "faint" => 2,
                "italic" => 3,
                "underline" => 4,
                "blink" => 5,
                "reverse" | "negative" => 7,
                "strikethrough" | "strike" => 9,
                "none" => return None,
                other => {
                    tracing::warn!(style = other, "ignored unknown text style");
                    return None;
                }
            };
            Some(code)
        })
        .collect()
}

/// 默认的级别样式表
pub fn default_level_styles() -> HashMap<String, StyleConfig> {
    [
        ("NOTSET", StyleConfig::new(Some("green"), None, None)),
        ("TRACE", StyleConfig::new(Some("turquoise"), None, Some("bold"))),
        ("DEBUG", StyleConfig::new(Some("blue"), None, Some("bold"))),
        ("INFO", StyleConfig::new(None, None, Some("bold"))),
        ("WARNING", StyleConfig::new(Some("orange"), None, Some("bold"))),
        ("ERROR", StyleConfig::new(Some("red"), None, Some("bold"))),
        ("CRITICAL", StyleConfig::new(Some("brown"), Some("tomato"), Some("bold"))),
    ]
    .into_iter()
    .map(|(name, style)| (name.to_string(), style))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("bright_blue"), Some(Color::BrightBlue));
        assert_eq!(
            parse_color("#414141"),
            Some(Color::TrueColor { r: 0x41, g: 0x41, b: 0x41 })
        );
        assert_eq!(
            parse_color("#fff"),
            Some(Color::TrueColor { r: 255, g: 255, b: 255 })
        );
        assert_eq!(
            parse_color("Turquoise"),
            Some(Color::TrueColor { r: 64, g: 224, b: 208 })
        );
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn test_style_prefix() {
        let style = TextStyle::from_attributes("fg=red style=bold");
        assert_eq!(style.prefix(), "\x1b[1;31m");

        let style = TextStyle::from_attributes("fg=grey bg=#414141");
        assert_eq!(style.prefix(), "\x1b[38;2;128;128;128;48;2;65;65;65m");

        assert!(TextStyle::from_attributes("").is_plain());
    }

    #[test]
    fn test_paint() {
        let mut out = String::new();
        TextStyle::from_attributes("style=bold+underline").paint("hi", &mut out);
        assert_eq!(out, "\x1b[1;4mhi\x1b[0m");

        let mut out = String::new();
        TextStyle::default().paint("hi", &mut out);
        assert_eq!(out, "hi");
    }

    #[test]
    fn test_default_level_styles() {
        let styles = default_level_styles();
        assert_eq!(styles.len(), 7);
        let critical = TextStyle::from_config(&styles["CRITICAL"]);
        assert!(critical.prefix().starts_with("\x1b[1;"));
        assert!(TextStyle::from_config(&styles["INFO"]).prefix() == "\x1b[1m");
    }

    #[test]
    fn test_truecolor_prefix_is_fixed() {
        let styles = default_level_styles();
        assert_eq!(
            TextStyle::from_config(&styles["TRACE"]).prefix(),
            "\x1b[1;38;2;64;224;208m"
        );
        assert_eq!(
            TextStyle::from_config(&styles["CRITICAL"]).prefix(),
            "\x1b[1;38;2;165;42;42;48;2;255;99;71m"
        );
        assert_eq!(
            TextStyle::from_attributes("bg=blue fg=orange").prefix(),
            "\x1b[38;2;255;165;0;44m"
        );
    }
}
