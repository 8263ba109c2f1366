use crate::log::{Accessor, Logger};
use crate::trace::repr::{short_type_name, truncate, type_path, Outcome};
use crate::trace::tracer::Tracer;
use std::fmt::Debug;
use std::sync::Arc;

/// 为任意值的方法和属性访问加上调用跟踪
///
/// 默认按类型路径（`app::model::Account`）从全局 manager 获取 logger，
/// 每次调用时重新获取；也可以用 `with_logger` 固定 logger。
/// 由方法开关（`set_class_tracing`）控制。
///
/// # 示例
///
/// ```ignore
/// let mut account = Traced::new(Account::default());
/// account.call_mut("deposit", &[&10], |a| a.deposit(10));
/// let balance = account.get("balance", |a| a.balance);
/// account.set("owner", "alice".to_string(), |a, v| a.owner = v);
/// ```
pub struct Traced<T> {
    inner: T,
    logger: Option<Arc<Logger>>,
    enabled: Option<bool>,
}

impl<T> Traced<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            logger: None,
            enabled: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// 覆盖方法开关
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn logger(&self) -> Arc<Logger> {
        match &self.logger {
            Some(logger) => Arc::clone(logger),
            None => crate::log::get_logger(type_path::<T>()),
        }
    }

    fn tracer(&self, name: &str) -> Tracer {
        let tracer = Tracer::method(self.logger(), name)
            .with_receiver(format!("<{}>", short_type_name::<T>()));
        match self.enabled {
            Some(enabled) => tracer.with_enabled(enabled),
            None => tracer,
        }
    }

    /// 跟踪一次只读方法调用
    pub fn call<R, F>(&self, name: &str, args: &[&dyn Debug], f: F) -> R
    where
        R: Debug,
        F: FnOnce(&T) -> R,
    {
        let inner = &self.inner;
        self.tracer(name).call(args, || f(inner))
    }

    /// 跟踪一次可变方法调用
    pub fn call_mut<R, F>(&mut self, name: &str, args: &[&dyn Debug], f: F) -> R
    where
        R: Debug,
        F: FnOnce(&mut T) -> R,
    {
        let tracer = self.tracer(name);
        let inner = &mut self.inner;
        tracer.call(args, || f(inner))
    }

    /// 跟踪一次属性读取：`( <T> ) => get` / `( <T> ) <= get( v )`
    pub fn get<R, F>(&self, name: &str, f: F) -> R
    where
        R: Debug,
        F: FnOnce(&T) -> R,
    {
        let tracer = self.tracer(name);
        let guard = tracer.enter_accessor(Some(Accessor::Getter), &[]);
        let value = f(&self.inner);
        if let Some(guard) = guard {
            let text = truncate(&format!("{:?}", value), guard.max_arg_len());
            guard.finish(Outcome::Returned(text));
        }
        value
    }

    /// 跟踪一次属性写入：`( <T> ) => set( v )` / `( <T> ) <= set`
    pub fn set<V, F>(&mut self, name: &str, value: V, f: F)
    where
        V: Debug,
        F: FnOnce(&mut T, V),
    {
        let tracer = self.tracer(name);
        let guard = tracer.enter_accessor(Some(Accessor::Setter), &[&value]);
        f(&mut self.inner, value);
        if let Some(guard) = guard {
            guard.finish(Outcome::Returned(String::new()));
        }
    }
}

impl<T> std::ops::Deref for Traced<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Debug> Debug for Traced<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traced")
            .field("inner", &self.inner)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::MemoryAppender;
    use crate::log::{LoggerManager, LoggerManagerConfig};
    use anyhow::Result;

    #[derive(Debug, Default)]
    struct Account {
        owner: String,
        balance: i64,
    }

    impl Account {
        fn deposit(&mut self, amount: i64) -> i64 {
            self.balance += amount;
            self.balance
        }
    }

    fn setup() -> Result<(LoggerManager, MemoryAppender)> {
        let mut config = LoggerManagerConfig::from_json(r#"{ level: "trace", appenders: [] }"#)?;
        config.formatter.colored = false;
        config.formatter.default_template = "{padding}{funcName}{message}".to_string();
        let manager = LoggerManager::new(config)?;
        let memory = MemoryAppender::default();
        manager.add_appender(Arc::new(memory.clone()))?;
        Ok((manager, memory))
    }

    #[test]
    fn test_traced_methods_and_accessors() -> Result<()> {
        let (manager, memory) = setup()?;
        let mut account = Traced::new(Account::default()).with_logger(manager.get_logger("bank"));

        assert_eq!(account.call_mut("deposit", &[&10], |a| a.deposit(10)), 10);
        assert_eq!(account.call("describe", &[], |a| a.owner.len()), 0);
        account.set("owner", "alice".to_string(), |a, v| a.owner = v);
        assert_eq!(account.get("balance", |a| a.balance), 10);

        assert_eq!(
            memory.lines(),
            vec![
                ">deposit( <Account>, 10 )",
                "<deposit( <Account>, 10 ) = 10",
                ">describe( <Account> )",
                "<describe( <Account> ) = 0",
                "@owner( <Account> ) => set( \"alice\" )",
                "@owner( <Account> ) <= set",
                "#balance( <Account> ) => get",
                "#balance( <Account> ) <= get( 10 )",
            ]
        );
        assert_eq!(account.owner, "alice");
        assert_eq!(manager.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_traced_respects_class_flag() -> Result<()> {
        let (manager, memory) = setup()?;
        manager.set_class_tracing(false);
        let mut account = Traced::new(Account::default()).with_logger(manager.get_logger("bank"));
        account.call_mut("deposit", &[&5], |a| a.deposit(5));
        assert!(memory.lines().is_empty());

        let mut forced = Traced::new(Account::default())
            .with_logger(manager.get_logger("bank"))
            .with_enabled(true);
        forced.call_mut("deposit", &[&5], |a| a.deposit(5));
        assert_eq!(memory.lines().len(), 2);
        assert_eq!(forced.into_inner().balance, 5);
        Ok(())
    }

    #[test]
    fn test_default_logger_name_is_type_path() {
        let account = Traced::new(Account::default());
        assert!(account.logger().name().ends_with("traced::tests::Account"));
    }
}
