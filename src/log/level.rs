use crate::log::error::{LogError, LogResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

/// 日志级别
///
/// 数值越大越严重，`TRACE` 位于 `DEBUG` 之下。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u16);

impl Level {
    /// 未设置阈值，所有级别都会输出
    pub const NOTSET: Level = Level(0);
    /// 调用跟踪
    pub const TRACE: Level = Level(5);
    /// 调试信息
    pub const DEBUG: Level = Level(10);
    /// 一般信息
    pub const INFO: Level = Level(20);
    /// 警告信息
    pub const WARNING: Level = Level(30);
    /// 错误信息
    pub const ERROR: Level = Level(40);
    /// 严重错误
    pub const CRITICAL: Level = Level(50);

    pub const fn from_value(value: u16) -> Self {
        Level(value)
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    /// 级别名称，未注册的级别返回 `Level N`
    pub fn name(self) -> String {
        resolve_value(self.0).unwrap_or_else(|_| format!("Level {}", self.0))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_name(s)
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(u16),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(value) => {
                resolve_value(value).map_err(serde::de::Error::custom)?;
                Ok(Level(value))
            }
            Repr::Name(name) => resolve_name(&name).map_err(serde::de::Error::custom),
        }
    }
}

/// 可以转换为 `Level` 的参数类型（级别、名称或数值）
pub trait IntoLevel {
    fn into_level(self) -> LogResult<Level>;
}

impl IntoLevel for Level {
    fn into_level(self) -> LogResult<Level> {
        Ok(self)
    }
}

impl IntoLevel for &str {
    fn into_level(self) -> LogResult<Level> {
        resolve_name(self)
    }
}

impl IntoLevel for &String {
    fn into_level(self) -> LogResult<Level> {
        resolve_name(self)
    }
}

impl IntoLevel for u16 {
    fn into_level(self) -> LogResult<Level> {
        resolve_value(self).map(|_| Level(self))
    }
}

/// 级别注册表
///
/// `by_name` 允许别名（FATAL、WARN），`by_value` 保存每个数值的规范名称。
pub struct LevelRegistry {
    by_name: HashMap<String, u16>,
    by_value: BTreeMap<u16, String>,
}

impl LevelRegistry {
    fn with_builtins() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_value: BTreeMap::new(),
        };
        for (name, level) in [
            ("NOTSET", Level::NOTSET),
            ("TRACE", Level::TRACE),
            ("DEBUG", Level::DEBUG),
            ("INFO", Level::INFO),
            ("WARNING", Level::WARNING),
            ("ERROR", Level::ERROR),
            ("CRITICAL", Level::CRITICAL),
        ] {
            registry.by_name.insert(name.to_string(), level.0);
            registry.by_value.insert(level.0, name.to_string());
        }
        registry.by_name.insert("WARN".to_string(), Level::WARNING.0);
        registry.by_name.insert("FATAL".to_string(), Level::CRITICAL.0);
        registry
    }

    fn register(&mut self, name: &str, value: u16) -> LogResult<Level> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(LogError::UnknownLevel(name));
        }

        match (self.by_name.get(&name), self.by_value.get(&value)) {
            (Some(&existing), _) if existing == value => Ok(Level(value)),
            (Some(&existing), _) => Err(LogError::ConflictingLevel {
                name,
                value,
                existing: format!("{}={}", self.by_value[&existing], existing),
            }),
            (None, Some(existing)) => Err(LogError::ConflictingLevel {
                name,
                value,
                existing: format!("{}={}", existing, value),
            }),
            (None, None) => {
                self.by_name.insert(name.clone(), value);
                self.by_value.insert(value, name);
                Ok(Level(value))
            }
        }
    }

    fn resolve_name(&self, name: &str) -> LogResult<Level> {
        let normalized = normalize(name);
        if let Some(&value) = self.by_name.get(&normalized) {
            return Ok(Level(value));
        }
        match normalized.parse::<u16>() {
            Ok(value) if self.by_value.contains_key(&value) => Ok(Level(value)),
            _ => Err(LogError::UnknownLevel(name.to_string())),
        }
    }

    fn resolve_value(&self, value: u16) -> LogResult<String> {
        self.by_value
            .get(&value)
            .cloned()
            .ok_or_else(|| LogError::UnknownLevel(value.to_string()))
    }

    fn levels(&self) -> Vec<(Level, String)> {
        self.by_value
            .iter()
            .map(|(value, name)| (Level(*value), name.clone()))
            .collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

static LEVELS: Lazy<RwLock<LevelRegistry>> =
    Lazy::new(|| RwLock::new(LevelRegistry::with_builtins()));

/// 注册新的日志级别
///
/// 相同的 (name, value) 重复注册是幂等的；名称或数值已被占用时返回 `ConflictingLevel`。
pub fn register_level(name: &str, value: u16) -> LogResult<Level> {
    let mut registry = LEVELS
        .write()
        .map_err(|_| LogError::Config("level registry poisoned".to_string()))?;
    registry.register(name, value)
}

/// 按名称解析级别（大小写不敏感，也接受已注册的数值字符串）
pub fn resolve_name(name: &str) -> LogResult<Level> {
    let registry = LEVELS
        .read()
        .map_err(|_| LogError::Config("level registry poisoned".to_string()))?;
    registry.resolve_name(name)
}

/// 按数值解析级别名称
pub fn resolve_value(value: u16) -> LogResult<String> {
    let registry = LEVELS
        .read()
        .map_err(|_| LogError::Config("level registry poisoned".to_string()))?;
    registry.resolve_value(value)
}

/// 所有已注册级别，按严重程度升序
pub fn registered_levels() -> Vec<(Level, String)> {
    LEVELS
        .read()
        .map(|registry| registry.levels())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_resolve() {
        assert_eq!(resolve_name("trace").unwrap(), Level::TRACE);
        assert_eq!(resolve_name("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(resolve_name("Info").unwrap(), Level::INFO);
        assert_eq!(resolve_name("warn").unwrap(), Level::WARNING);
        assert_eq!(resolve_name("fatal").unwrap(), Level::CRITICAL);
        assert_eq!(resolve_value(5).unwrap(), "TRACE");
        assert_eq!(resolve_value(50).unwrap(), "CRITICAL");
    }

    #[test]
    fn test_trace_below_builtins() {
        for level in [
            Level::DEBUG,
            Level::INFO,
            Level::WARNING,
            Level::ERROR,
            Level::CRITICAL,
        ] {
            assert!(Level::TRACE < level);
        }
        assert!(Level::NOTSET < Level::TRACE);
    }

    #[test]
    fn test_unknown_level() {
        assert_eq!(
            resolve_name("verbose"),
            Err(LogError::UnknownLevel("verbose".to_string()))
        );
        assert!(matches!(resolve_value(7), Err(LogError::UnknownLevel(_))));
        assert!(matches!(7u16.into_level(), Err(LogError::UnknownLevel(_))));
    }

    #[test]
    fn test_register_idempotent() {
        assert_eq!(register_level("TRACE", 5).unwrap(), Level::TRACE);
        assert_eq!(register_level("trace", 5).unwrap(), Level::TRACE);
    }

    #[test]
    fn test_register_conflicts() {
        assert!(matches!(
            register_level("TRACE", 7),
            Err(LogError::ConflictingLevel { .. })
        ));
        assert!(matches!(
            register_level("CHATTY", 10),
            Err(LogError::ConflictingLevel { .. })
        ));
    }

    #[test]
    fn test_register_new_level() {
        let notice = register_level("NOTICE", 25).unwrap();
        assert_eq!(notice.value(), 25);
        assert_eq!(notice.to_string(), "NOTICE");
        assert_eq!(resolve_name("notice").unwrap(), notice);
        assert_eq!(resolve_name("25").unwrap(), notice);
        assert!(Level::INFO < notice && notice < Level::WARNING);
    }

    #[test]
    fn test_unregistered_display() {
        assert_eq!(Level::from_value(33).to_string(), "Level 33");
    }

    #[test]
    fn test_level_serde() {
        let level: Level = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, Level::DEBUG);
        let level: Level = serde_json::from_str("40").unwrap();
        assert_eq!(level, Level::ERROR);
        assert!(serde_json::from_str::<Level>("\"loud\"").is_err());
        assert_eq!(serde_json::to_string(&Level::TRACE).unwrap(), "\"TRACE\"");
    }

    #[test]
    fn test_registered_levels_sorted() {
        let levels = registered_levels();
        let values: Vec<u16> = levels.iter().map(|(level, _)| level.value()).collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(values, sorted);
        assert!(levels.iter().any(|(_, name)| name == "TRACE"));
    }
}
