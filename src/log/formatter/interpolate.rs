//! `%` 风格的消息插值
//!
//! 支持 `%s %r %d %i %u %f %F %e %E %x %X %o %c %%`，以及 `-0+ #` 标志、宽度和精度。
//! 参数数量或类型不匹配时返回 `LogError::Format`。

use crate::log::error::{LogError, LogResult};
use crate::log::log_record::ArgValue;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// 使用参数插值消息模板，参数为空时原样返回
pub fn interpolate(template: &str, args: &[ArgValue]) -> LogResult<String> {
    if args.is_empty() {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let spec = parse_spec(&mut chars)?;
        let conversion = chars
            .next()
            .ok_or_else(|| LogError::Format("incomplete format".to_string()))?;
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let arg = remaining.next().ok_or_else(|| {
            LogError::Format("not enough arguments for format string".to_string())
        })?;
        let body = convert(conversion, &spec, arg)?;
        pad_into(&mut out, &body, &spec, is_numeric(conversion));
    }

    if remaining.next().is_some() {
        return Err(LogError::Format(
            "not all arguments converted during string formatting".to_string(),
        ));
    }

    Ok(out)
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> LogResult<Spec> {
    let mut spec = Spec::default();

    if chars.peek() == Some(&'(') {
        return Err(LogError::Format(
            "named conversions are not supported".to_string(),
        ));
    }

    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.left = true,
            '0' => spec.zero = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '#' => spec.alt = true,
            _ => break,
        }
        chars.next();
    }

    spec.width = parse_number(chars)?;

    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(parse_number(chars)?.unwrap_or(0));
    }

    // 长度修饰符没有意义，直接跳过
    while matches!(chars.peek(), Some('h') | Some('l') | Some('L')) {
        chars.next();
    }

    Ok(spec)
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> LogResult<Option<usize>> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }
    digits
        .parse()
        .map(Some)
        .map_err(|_| LogError::Format(format!("width or precision too large: {}", digits)))
}

fn is_numeric(conversion: char) -> bool {
    matches!(
        conversion,
        'd' | 'i' | 'u' | 'f' | 'F' | 'e' | 'E' | 'x' | 'X' | 'o'
    )
}

fn type_name(arg: &ArgValue) -> &'static str {
    match arg {
        ArgValue::String(_) => "str",
        ArgValue::I64(_) | ArgValue::U64(_) => "int",
        ArgValue::F64(_) => "float",
        ArgValue::Bool(_) => "bool",
        ArgValue::Null => "NoneType",
        ArgValue::Repr(_) => "object",
    }
}

fn as_integer(conversion: char, arg: &ArgValue, allow_float: bool) -> LogResult<i128> {
    match arg {
        ArgValue::I64(n) => Ok(*n as i128),
        ArgValue::U64(n) => Ok(*n as i128),
        ArgValue::Bool(b) => Ok(*b as i128),
        ArgValue::F64(f) if allow_float && f.is_finite() => Ok(f.trunc() as i128),
        other => Err(LogError::Format(format!(
            "%{} format: an integer is required, not {}",
            conversion,
            type_name(other)
        ))),
    }
}

fn as_float(conversion: char, arg: &ArgValue) -> LogResult<f64> {
    match arg {
        ArgValue::F64(f) => Ok(*f),
        ArgValue::I64(n) => Ok(*n as f64),
        ArgValue::U64(n) => Ok(*n as f64),
        ArgValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(LogError::Format(format!(
            "%{} format: a real number is required, not {}",
            conversion,
            type_name(other)
        ))),
    }
}

fn signed(negative: bool, digits: String, spec: &Spec) -> String {
    if negative {
        format!("-{}", digits)
    } else if spec.plus {
        format!("+{}", digits)
    } else if spec.space {
        format!(" {}", digits)
    } else {
        digits
    }
}

fn convert(conversion: char, spec: &Spec, arg: &ArgValue) -> LogResult<String> {
    let body = match conversion {
        's' | 'r' => {
            let text = if conversion == 's' {
                display_str(arg)
            } else {
                arg.to_repr()
            };
            match spec.precision {
                Some(precision) => text.chars().take(precision).collect(),
                None => text,
            }
        }
        'd' | 'i' | 'u' => {
            let n = as_integer(conversion, arg, true)?;
            signed(n < 0, n.unsigned_abs().to_string(), spec)
        }
        'x' | 'X' | 'o' => {
            let n = as_integer(conversion, arg, false)?;
            let magnitude = n.unsigned_abs();
            let digits = match conversion {
                'x' => format!("{}{:x}", if spec.alt { "0x" } else { "" }, magnitude),
                'X' => format!("{}{:X}", if spec.alt { "0X" } else { "" }, magnitude),
                _ => format!("{}{:o}", if spec.alt { "0o" } else { "" }, magnitude),
            };
            signed(n < 0, digits, spec)
        }
        'f' | 'F' => {
            let f = as_float(conversion, arg)?;
            let precision = spec.precision.unwrap_or(6);
            signed(
                f.is_sign_negative() && f != 0.0,
                format!("{:.*}", precision, f.abs()),
                spec,
            )
        }
        'e' | 'E' => {
            let f = as_float(conversion, arg)?;
            let precision = spec.precision.unwrap_or(6);
            let text = exponent(f.abs(), precision);
            let text = if conversion == 'E' {
                text.to_uppercase()
            } else {
                text
            };
            signed(f.is_sign_negative() && f != 0.0, text, spec)
        }
        'c' => match arg {
            ArgValue::String(s) if s.chars().count() == 1 => s.clone(),
            ArgValue::I64(_) | ArgValue::U64(_) => {
                let n = as_integer(conversion, arg, false)?;
                u32::try_from(n)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .ok_or_else(|| LogError::Format("%c arg not in range".to_string()))?
            }
            other => {
                return Err(LogError::Format(format!(
                    "%c requires int or char, not {}",
                    type_name(other)
                )))
            }
        },
        other => {
            return Err(LogError::Format(format!(
                "unsupported format character '{}'",
                other
            )))
        }
    };
    Ok(body)
}

/// `%s` 的展示形式，整数值的浮点数保留 `.0`
fn display_str(arg: &ArgValue) -> String {
    match arg {
        ArgValue::F64(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
            format!("{:.1}", f)
        }
        other => other.to_string(),
    }
}

/// 指数形式，指数部分带符号且至少两位：`1.500000e+03`
fn exponent(value: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, value);
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

fn pad_into(out: &mut String, body: &str, spec: &Spec, numeric: bool) {
    let len = body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        out.push_str(body);
        return;
    }
    let fill = width - len;

    if spec.left {
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && numeric {
        // 补零放在符号之后
        let (sign, digits) = match body.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (Some(c), &body[1..]),
            _ => (None, body),
        };
        if let Some(sign) = sign {
            out.push(sign);
        }
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(body);
    }
}
