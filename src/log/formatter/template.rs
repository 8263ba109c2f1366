use crate::log::error::{LogError, LogResult};
use crate::log::formatter::style::TextStyle;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::borrow::Cow;

/// 颜色标记：`<color fg=.. bg=.. style=..>text</>` 或 `<level>text</>`
static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(color|level)\s*([^>]*)>(.*?)</>").expect("markup regex is valid")
});

/// 模板可引用的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Asctime,
    LevelName,
    LevelNo,
    Name,
    Message,
    Padding,
    FuncName,
    Prefix,
    Thread,
    File,
    Line,
}

impl Field {
    fn parse(name: &str) -> LogResult<Self> {
        let field = match name {
            "asctime" => Field::Asctime,
            "levelname" => Field::LevelName,
            "levelno" => Field::LevelNo,
            "name" => Field::Name,
            "message" => Field::Message,
            "padding" => Field::Padding,
            "funcName" | "realFunctionName" => Field::FuncName,
            "prefix" => Field::Prefix,
            "thread" => Field::Thread,
            "file" => Field::File,
            "line" => Field::Line,
            other => {
                return Err(LogError::Format(format!(
                    "unknown template field '{}'",
                    other
                )))
            }
        };
        Ok(field)
    }

    fn is_numeric(self) -> bool {
        matches!(self, Field::LevelNo | Field::Line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

/// `[[fill]align][width][.precision][s|d]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSpec {
    fill: char,
    align: Option<Align>,
    width: usize,
    precision: Option<usize>,
}

impl FieldSpec {
    fn parse(spec: &str) -> LogResult<Self> {
        let invalid = || LogError::Format(format!("invalid format spec '{}'", spec));
        let chars: Vec<char> = spec.chars().collect();
        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        };

        let mut parsed = FieldSpec {
            fill: ' ',
            align: None,
            width: 0,
            precision: None,
        };
        let mut i = 0;
        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            parsed.fill = chars[0];
            parsed.align = align_of(chars[1]);
            i = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_of) {
            parsed.align = Some(align);
            i = 1;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i > start {
            parsed.width = chars[start..i]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| invalid())?;
        }

        if i < chars.len() && chars[i] == '.' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i == start {
                return Err(invalid());
            }
            parsed.precision = Some(
                chars[start..i]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .map_err(|_| invalid())?,
            );
        }

        if i < chars.len() && matches!(chars[i], 's' | 'd') {
            i += 1;
        }
        if i != chars.len() {
            return Err(invalid());
        }
        Ok(parsed)
    }

    fn apply(&self, value: &str, numeric: bool, out: &mut String) {
        let value: Cow<'_, str> = match self.precision {
            Some(precision) if !numeric => value.chars().take(precision).collect(),
            _ => Cow::Borrowed(value),
        };
        let len = value.chars().count();
        if len >= self.width {
            out.push_str(&value);
            return;
        }

        let fill = self.width - len;
        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });
        let (before, after) = match align {
            Align::Left => (0, fill),
            Align::Right => (fill, 0),
            Align::Center => (fill / 2, fill - fill / 2),
        };
        out.extend(std::iter::repeat(self.fill).take(before));
        out.push_str(&value);
        out.extend(std::iter::repeat(self.fill).take(after));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Field(Field, Option<FieldSpec>),
}

#[derive(Debug, Clone, PartialEq)]
enum SegmentStyle {
    Plain,
    Level,
    Fixed(TextStyle),
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    style: SegmentStyle,
    pieces: Vec<Piece>,
}

/// 渲染时的字段取值
pub struct FieldValues<'a> {
    pub asctime: String,
    pub level_name: String,
    pub level_no: u16,
    pub name: &'a str,
    pub message: &'a str,
    pub padding: &'a str,
    pub func_name: &'a str,
    pub prefix: &'a str,
    pub thread: &'a str,
    pub file: &'a str,
    pub line: Option<u32>,
}

impl FieldValues<'_> {
    fn get(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Asctime => Cow::Borrowed(&self.asctime),
            Field::LevelName => Cow::Borrowed(&self.level_name),
            Field::LevelNo => Cow::Owned(self.level_no.to_string()),
            Field::Name => Cow::Borrowed(self.name),
            Field::Message => Cow::Borrowed(self.message),
            Field::Padding => Cow::Borrowed(self.padding),
            Field::FuncName => Cow::Borrowed(self.func_name),
            Field::Prefix => Cow::Borrowed(self.prefix),
            Field::Thread => Cow::Borrowed(self.thread),
            Field::File => Cow::Borrowed(self.file),
            Field::Line => Cow::Owned(self.line.map(|l| l.to_string()).unwrap_or_default()),
        }
    }
}

/// 预编译的格式模板
///
/// 颜色标记在编译期拆分为片段，渲染时消息内容中的 `<level>` 等文本不会被当作标记。
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> LogResult<Self> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in MARKUP.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment {
                    style: SegmentStyle::Plain,
                    pieces: parse_pieces(&source[last..whole.start()])?,
                });
            }
            let style = match &caps[1] {
                "level" => SegmentStyle::Level,
                _ => SegmentStyle::Fixed(TextStyle::from_attributes(&caps[2])),
            };
            segments.push(Segment {
                style,
                pieces: parse_pieces(&caps[3])?,
            });
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment {
                style: SegmentStyle::Plain,
                pieces: parse_pieces(&source[last..])?,
            });
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 渲染模板；`level_style` 为 `None` 时输出纯文本
    pub fn render(&self, values: &FieldValues<'_>, level_style: Option<&TextStyle>, out: &mut String) {
        let mut text = String::new();
        for segment in &self.segments {
            text.clear();
            for piece in &segment.pieces {
                match piece {
                    Piece::Literal(literal) => text.push_str(literal),
                    Piece::Field(field, spec) => {
                        let value = values.get(*field);
                        match spec {
                            Some(spec) => spec.apply(&value, field.is_numeric(), &mut text),
                            None => text.push_str(&value),
                        }
                    }
                }
            }

            match (level_style, &segment.style) {
                (None, _) | (_, SegmentStyle::Plain) => out.push_str(&text),
                (Some(level), SegmentStyle::Level) => level.paint(&text, out),
                (Some(_), SegmentStyle::Fixed(style)) => style.paint(&text, out),
            }
        }
    }
}

fn parse_pieces(source: &str) -> LogResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => inner.push(c),
                        None => {
                            return Err(LogError::Format(format!(
                                "unclosed field in template '{}'",
                                source
                            )))
                        }
                    }
                }
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                let (name, spec) = match inner.split_once(':') {
                    Some((name, spec)) => (name, Some(FieldSpec::parse(spec)?)),
                    None => (inner.as_str(), None),
                };
                pieces.push(Piece::Field(Field::parse(name.trim())?, spec));
            }
            '}' => {
                return Err(LogError::Format(format!(
                    "single '}}' in template '{}'",
                    source
                )))
            }
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}
