// 按 trait 注册的构造器表

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

use super::type_options::TypeOptions;

// 返回 Box<dyn Any>，实际内容是 Box<dyn Trait>
type TraitConstructor = Box<dyn Fn(JsonValue) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

// 外层 key 是 Trait 的 TypeId，内层 key 是类型名称
static TRAIT_REGISTRY: Lazy<RwLock<HashMap<TypeId, HashMap<String, TraitConstructor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 为实现特定 Trait 的类型注册构造函数
///
/// 构造可能失败（例如打开文件），失败原因会原样返回给调用方。
/// 同名重复注册会覆盖之前的构造器。
///
/// # 示例
/// ```ignore
/// register_trait::<FileAppender, dyn LogAppender, FileAppenderConfig>("FileAppender")?;
///
/// let appender: Box<dyn LogAppender> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn register_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Send + Sync + 'static,
    T: TryFrom<Config>,
    <T as TryFrom<Config>>::Error: Into<anyhow::Error>,
    Box<T>: Into<Box<Trait>>,
{
    let trait_id = TypeId::of::<Trait>();

    let constructor: TraitConstructor = Box::new(move |value| {
        let config: Config = serde_json::from_value(value)?;
        let instance = T::try_from(config).map_err(Into::into)?;
        let trait_object: Box<Trait> = Box::new(instance).into();
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    let mut registry = TRAIT_REGISTRY
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    registry
        .entry(trait_id)
        .or_default()
        .insert(type_name.to_string(), constructor);

    Ok(())
}

/// 根据 TypeOptions 创建 trait object
pub fn create_trait_from_type_options<Trait>(type_options: &TypeOptions) -> Result<Box<Trait>>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let trait_id = TypeId::of::<Trait>();
    let registry = TRAIT_REGISTRY
        .read()
        .map_err(|_| anyhow!("Failed to acquire read lock"))?;

    let constructor = registry
        .get(&trait_id)
        .and_then(|constructors| constructors.get(&type_options.type_name))
        .ok_or_else(|| anyhow!("Type '{}' not registered for this trait", type_options.type_name))?;

    let any_box = constructor(type_options.options.clone())?;

    any_box
        .downcast::<Box<Trait>>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow!("Failed to downcast to target trait type"))
}

/// 已注册到某个 Trait 下的类型名称（排序后）
pub fn registered_type_names<Trait>() -> Vec<String>
where
    Trait: ?Sized + 'static,
{
    let mut names: Vec<String> = TRAIT_REGISTRY
        .read()
        .map(|registry| {
            registry
                .get(&TypeId::of::<Trait>())
                .map(|constructors| constructors.keys().cloned().collect())
                .unwrap_or_default()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Debug, Clone, Deserialize)]
    struct HelloConfig {
        name: String,
    }

    struct Hello {
        name: String,
    }

    impl TryFrom<HelloConfig> for Hello {
        type Error = anyhow::Error;

        fn try_from(config: HelloConfig) -> Result<Self> {
            if config.name.is_empty() {
                return Err(anyhow!("name is empty"));
            }
            Ok(Self { name: config.name })
        }
    }

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello {}", self.name)
        }
    }

    crate::impl_box_from!(Hello => dyn Greeter);

    #[test]
    fn test_register_and_create() -> Result<()> {
        register_trait::<Hello, dyn Greeter, HelloConfig>("Hello")?;

        let options = TypeOptions::from_json(r#"{ type: "Hello", options: { name: "log" } }"#)?;
        let greeter: Box<dyn Greeter> = create_trait_from_type_options(&options)?;
        assert_eq!(greeter.greet(), "hello log");
        assert!(registered_type_names::<dyn Greeter>().contains(&"Hello".to_string()));
        Ok(())
    }

    #[test]
    fn test_construction_error_propagates() -> Result<()> {
        register_trait::<Hello, dyn Greeter, HelloConfig>("Hello")?;

        let options = TypeOptions::from_json(r#"{ type: "Hello", options: { name: "" } }"#)?;
        let err = create_trait_from_type_options::<dyn Greeter>(&options)
            .err()
            .expect("empty name must fail");
        assert!(err.to_string().contains("name is empty"));
        Ok(())
    }

    #[test]
    fn test_unregistered_type() {
        let options = TypeOptions {
            type_name: "Nobody".to_string(),
            options: serde_json::json!({}),
        };
        let err = create_trait_from_type_options::<dyn Greeter>(&options)
            .err()
            .expect("unregistered type must fail");
        assert!(err.to_string().contains("not registered"));
    }
}
