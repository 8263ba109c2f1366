use crate::log::{Accessor, Level, LogRecord, Logger};
use crate::trace::flags::TraceFlags;
use crate::trace::repr::{truncate, Outcome};
use once_cell::sync::OnceCell;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// 被跟踪对象的类别，分别由函数开关和方法开关控制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Function,
    Method,
}

impl TraceKind {
    /// 站点覆盖 > 全局开关（默认打开）
    pub fn is_enabled(self, site: Option<bool>, flags: &TraceFlags) -> bool {
        site.unwrap_or_else(|| match self {
            TraceKind::Function => flags.functions(),
            TraceKind::Method => flags.classes(),
        })
    }
}

/// 一次被跟踪的调用
///
/// 创建时输出入口记录并增加缩进；`finish` 或被丢弃时减少缩进并输出出口记录。
/// 调用体 panic 时记录 `panicked`，异步调用未完成即被丢弃时记录 `cancelled`。
#[must_use = "the call is closed when the guard is finished or dropped"]
pub struct CallGuard {
    logger: Arc<Logger>,
    func_name: String,
    signature: String,
    accessor: Option<Accessor>,
    max_arg_len: usize,
    finished: bool,
}

impl CallGuard {
    /// 输出入口记录并增加缩进
    ///
    /// 入口消息：
    /// - 普通调用 `( a, b )`
    /// - getter `( <Type> ) => get`
    /// - setter `( <Type> ) => set( v )`
    pub fn enter(
        logger: Arc<Logger>,
        func_name: impl Into<String>,
        accessor: Option<Accessor>,
        receiver: Option<String>,
        args: Vec<String>,
    ) -> Self {
        let (signature, message) = match accessor {
            None => {
                let signature = argument_list(receiver.into_iter().chain(args));
                (signature.clone(), signature)
            }
            Some(Accessor::Getter) => {
                let signature = argument_list(receiver);
                let message = format!("{} => get", signature);
                (signature, message)
            }
            Some(Accessor::Setter) => {
                let signature = argument_list(receiver);
                let message = format!("{} => set{}", signature, argument_list(args));
                (signature, message)
            }
        };

        let max_arg_len = logger.trace_flags().max_arg_len();
        let guard = Self {
            logger,
            func_name: func_name.into(),
            signature,
            accessor,
            max_arg_len,
            finished: false,
        };
        if let Err(err) = guard.logger.indent_record(guard.record(message)) {
            tracing::warn!(logger = %guard.logger.name(), error = %err, "trace entry record failed");
        }
        guard
    }

    pub fn max_arg_len(&self) -> usize {
        self.max_arg_len
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// 以调用结果结束调用
    pub fn finish(mut self, outcome: Outcome) {
        self.finished = true;
        let message = match (self.accessor, outcome) {
            (None, Outcome::Returned(value)) => format!("{} = {}", self.signature, value),
            (Some(Accessor::Getter), Outcome::Returned(value)) => {
                format!("{} <= get( {} )", self.signature, value)
            }
            (Some(Accessor::Setter), Outcome::Returned(_)) => format!("{} <= set", self.signature),
            (None, Outcome::Raised(err)) => format!("{} raised {}", self.signature, err),
            (Some(Accessor::Getter), Outcome::Raised(err)) => {
                format!("{} <= get raised {}", self.signature, err)
            }
            (Some(Accessor::Setter), Outcome::Raised(err)) => {
                format!("{} <= set raised {}", self.signature, err)
            }
        };
        self.exit(message);
    }

    fn exit(&self, message: String) {
        if let Err(err) = self.logger.unindent_record(self.record(message)) {
            tracing::warn!(logger = %self.logger.name(), error = %err, "trace exit record failed");
        }
    }

    fn record(&self, message: String) -> LogRecord {
        let record = LogRecord::new(Level::TRACE, message)
            .with_func_name(self.func_name.as_str())
            .with_prefix("");
        match self.accessor {
            Some(accessor) => record.with_accessor(accessor),
            None => record,
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let message = if std::thread::panicking() {
            format!("{} panicked", self.signature)
        } else {
            format!("{} cancelled", self.signature)
        };
        self.exit(message);
    }
}

impl std::fmt::Debug for CallGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGuard")
            .field("logger", &self.logger.name())
            .field("func_name", &self.func_name)
            .field("signature", &self.signature)
            .field("finished", &self.finished)
            .finish()
    }
}

fn argument_list(args: impl IntoIterator<Item = String>) -> String {
    let args: Vec<String> = args.into_iter().collect();
    if args.is_empty() {
        "()".to_string()
    } else {
        format!("( {} )", args.join(", "))
    }
}

fn debug_args(args: &[&dyn Debug], max_len: usize) -> Vec<String> {
    args.iter()
        .map(|arg| truncate(&format!("{:?}", arg), max_len))
        .collect()
}

/// `#[ftrace]` / `#[ctrace]` 展开生成的静态调用点
///
/// logger 在每次调用时按名称从全局 manager 获取，`cilog::init` 之后立即生效。
pub struct CallSite {
    module: &'static str,
    owner: Option<&'static str>,
    name: &'static str,
    kind: TraceKind,
    accessor: Option<Accessor>,
    enabled: Option<bool>,
    logger_name: OnceCell<String>,
}

impl CallSite {
    pub const fn new(
        module: &'static str,
        owner: Option<&'static str>,
        name: &'static str,
        kind: TraceKind,
        accessor: Option<Accessor>,
        enabled: Option<bool>,
    ) -> Self {
        Self {
            module,
            owner,
            name,
            kind,
            accessor,
            enabled,
            logger_name: OnceCell::new(),
        }
    }

    pub const fn function(module: &'static str, name: &'static str) -> Self {
        Self::new(module, None, name, TraceKind::Function, None, None)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// logger 名称：模块路径，方法再加上 `::Type`
    pub fn logger_name(&self) -> &str {
        self.logger_name.get_or_init(|| match self.owner {
            Some(owner) => format!("{}::{}", self.module, owner),
            None => self.module.to_string(),
        })
    }

    pub fn logger(&self) -> Arc<Logger> {
        crate::log::get_logger(self.logger_name())
    }

    /// 跟踪开启时输出入口记录并返回 guard，关闭时返回 `None`
    ///
    /// 参数展示在确定开启之后才计算
    pub fn enter<F>(&self, receiver: Option<fn() -> String>, args: F) -> Option<CallGuard>
    where
        F: FnOnce(usize) -> Vec<String>,
    {
        let logger = self.logger();
        if !self.kind.is_enabled(self.enabled, logger.trace_flags()) {
            return None;
        }
        let args = args(logger.trace_flags().max_arg_len());
        Some(CallGuard::enter(
            logger,
            self.name,
            self.accessor,
            receiver.map(|receiver| receiver()),
            args,
        ))
    }
}

impl std::fmt::Debug for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("logger_name", &self.logger_name())
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("accessor", &self.accessor)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// 不借助宏的调用跟踪
///
/// # 示例
///
/// ```ignore
/// let tracer = Tracer::function(cilog::get_logger("app"), "add");
/// let sum = tracer.call(&[&2, &3], || 2 + 3);
/// ```
#[derive(Debug, Clone)]
pub struct Tracer {
    logger: Arc<Logger>,
    name: String,
    kind: TraceKind,
    enabled: Option<bool>,
    receiver: Option<String>,
}

impl Tracer {
    pub fn function(logger: Arc<Logger>, name: impl Into<String>) -> Self {
        Self {
            logger,
            name: name.into(),
            kind: TraceKind::Function,
            enabled: None,
            receiver: None,
        }
    }

    pub fn method(logger: Arc<Logger>, name: impl Into<String>) -> Self {
        Self {
            kind: TraceKind::Method,
            ..Self::function(logger, name)
        }
    }

    /// 站点覆盖，优先于全局开关
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// 入口记录中展示的接收者，如 `<Account>`
    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn is_enabled(&self) -> bool {
        self.kind.is_enabled(self.enabled, self.logger.trace_flags())
    }

    /// 跟踪开启时输出入口记录
    pub fn enter(&self, args: &[&dyn Debug]) -> Option<CallGuard> {
        self.enter_accessor(None, args)
    }

    pub(crate) fn enter_accessor(
        &self,
        accessor: Option<Accessor>,
        args: &[&dyn Debug],
    ) -> Option<CallGuard> {
        if !self.is_enabled() {
            return None;
        }
        let max_len = self.logger.trace_flags().max_arg_len();
        Some(CallGuard::enter(
            Arc::clone(&self.logger),
            self.name.as_str(),
            accessor,
            self.receiver.clone(),
            debug_args(args, max_len),
        ))
    }

    /// 跟踪一次同步调用，返回值以 `Debug` 展示
    pub fn call<R, F>(&self, args: &[&dyn Debug], f: F) -> R
    where
        R: Debug,
        F: FnOnce() -> R,
    {
        let guard = self.enter(args);
        let output = f();
        if let Some(guard) = guard {
            let value = truncate(&format!("{:?}", output), guard.max_arg_len());
            guard.finish(Outcome::Returned(value));
        }
        output
    }

    /// 跟踪一次返回 `Result` 的调用，`Err` 记录为 `raised` 后原样返回
    pub fn try_call<T, E, F>(&self, args: &[&dyn Debug], f: F) -> Result<T, E>
    where
        T: Debug,
        E: Debug,
        F: FnOnce() -> Result<T, E>,
    {
        let guard = self.enter(args);
        let output = f();
        if let Some(guard) = guard {
            let outcome = result_outcome(&output, guard.max_arg_len());
            guard.finish(outcome);
        }
        output
    }

    /// 跟踪一次异步调用
    ///
    /// 入口记录在调用本方法时输出；future 未完成即被丢弃时记录 `cancelled`。
    pub fn call_async<F>(&self, args: &[&dyn Debug], future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
        F::Output: Debug,
    {
        let guard = self.enter(args);
        async move {
            let output = future.await;
            if let Some(guard) = guard {
                let value = truncate(&format!("{:?}", output), guard.max_arg_len());
                guard.finish(Outcome::Returned(value));
            }
            output
        }
    }

    /// 跟踪一次返回 `Result` 的异步调用
    pub fn try_call_async<T, E, F>(
        &self,
        args: &[&dyn Debug],
        future: F,
    ) -> impl Future<Output = Result<T, E>>
    where
        T: Debug,
        E: Debug,
        F: Future<Output = Result<T, E>>,
    {
        let guard = self.enter(args);
        async move {
            let output = future.await;
            if let Some(guard) = guard {
                let outcome = result_outcome(&output, guard.max_arg_len());
                guard.finish(outcome);
            }
            output
        }
    }
}

fn result_outcome<T: Debug, E: Debug>(output: &Result<T, E>, max_len: usize) -> Outcome {
    let text = truncate(&format!("{:?}", output), max_len);
    match output {
        Ok(_) => Outcome::Returned(text),
        Err(_) => Outcome::Raised(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::MemoryAppender;
    use crate::log::{LoggerManager, LoggerManagerConfig};
    use anyhow::Result;

    fn setup(template: &str) -> Result<(LoggerManager, MemoryAppender)> {
        let mut config = LoggerManagerConfig::from_json(r#"{ level: "trace", appenders: [] }"#)?;
        config.formatter.colored = false;
        config.formatter.default_template = template.to_string();
        let manager = LoggerManager::new(config)?;
        let memory = MemoryAppender::default();
        manager.add_appender(Arc::new(memory.clone()))?;
        Ok((manager, memory))
    }

    #[test]
    fn test_call_records_entry_and_exit() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{prefix}{message}")?;
        let tracer = Tracer::function(manager.get_logger("calc"), "add");
        let sum = tracer.call(&[&2, &3], || 2 + 3);
        assert_eq!(sum, 5);
        assert_eq!(memory.lines(), vec![">add( 2, 3 )", "<add( 2, 3 ) = 5"]);
        assert_eq!(manager.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_nested_calls_indent() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{message}")?;
        let logger = manager.get_logger("calc");
        let outer = Tracer::function(Arc::clone(&logger), "outer");
        let inner = Tracer::function(Arc::clone(&logger), "inner");
        outer.call(&[], || {
            logger.debug("working").unwrap();
            inner.call(&[&"x"], || ())
        });
        assert_eq!(
            memory.lines(),
            vec![
                ">outer()",
                "    working",
                "-->inner( \"x\" )",
                "<--inner( \"x\" ) = ()",
                "<outer() = ()",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_try_call_logs_err_and_returns_it() -> Result<()> {
        let (manager, memory) = setup("{funcName}{message}")?;
        let tracer = Tracer::function(manager.get_logger("io"), "open");
        let result: std::result::Result<u8, String> =
            tracer.try_call(&[&"a.txt"], || Err("missing".to_string()));
        assert_eq!(result, Err("missing".to_string()));
        assert_eq!(
            memory.lines(),
            vec![
                "open( \"a.txt\" )",
                "open( \"a.txt\" ) raised Err(\"missing\")",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_panic_closes_call() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{message}")?;
        let tracer = Tracer::function(manager.get_logger("calc"), "explode");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tracer.call(&[], || -> u8 { panic!("boom") })
        }));
        assert!(result.is_err());
        assert_eq!(memory.lines(), vec![">explode()", "<explode() panicked"]);
        assert_eq!(manager.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_disabled_tracer_is_transparent() -> Result<()> {
        let (manager, memory) = setup("{message}")?;
        let logger = manager.get_logger("calc");

        let tracer = Tracer::function(Arc::clone(&logger), "add").with_enabled(false);
        assert_eq!(tracer.call(&[&1, &1], || 2), 2);

        manager.set_function_tracing(false);
        let tracer = Tracer::function(Arc::clone(&logger), "add");
        assert!(!tracer.is_enabled());
        assert_eq!(tracer.call(&[&1, &1], || 2), 2);
        assert!(memory.lines().is_empty());

        // 站点覆盖优先于全局开关
        let forced = Tracer::function(logger, "add").with_enabled(true);
        forced.call(&[&1, &1], || 2);
        assert_eq!(memory.lines().len(), 2);
        Ok(())
    }

    #[test]
    fn test_method_kind_follows_class_flag() -> Result<()> {
        let (manager, _memory) = setup("{message}")?;
        let logger = manager.get_logger("model");
        manager.set_class_tracing(false);
        assert!(!Tracer::method(Arc::clone(&logger), "save").is_enabled());
        assert!(Tracer::function(logger, "save").is_enabled());
        Ok(())
    }

    #[test]
    fn test_args_truncated() -> Result<()> {
        let (manager, memory) = setup("{funcName}{message}")?;
        manager.trace_flags().set_max_arg_len(8);
        let tracer = Tracer::function(manager.get_logger("calc"), "echo");
        let text = "abcdefghijkl".to_string();
        tracer.call(&[&text], || 1);
        assert_eq!(memory.lines()[0], "echo( \"abcd... )");
        Ok(())
    }

    #[test]
    fn test_accessor_records() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{message}")?;
        let tracer = Tracer::method(manager.get_logger("model::Account"), "balance")
            .with_receiver("<Account>");

        let guard = tracer.enter_accessor(Some(Accessor::Getter), &[]);
        guard.unwrap().finish(Outcome::Returned("10".to_string()));

        let guard = tracer.enter_accessor(Some(Accessor::Setter), &[&20]);
        guard.unwrap().finish(Outcome::Returned("()".to_string()));

        assert_eq!(
            memory.lines(),
            vec![
                "#balance( <Account> ) => get",
                "#balance( <Account> ) <= get( 10 )",
                "@balance( <Account> ) => set( 20 )",
                "@balance( <Account> ) <= set",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_call_async() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{message}")?;
        let tracer = Tracer::function(manager.get_logger("net"), "fetch");
        let value = tracer
            .call_async(&[&7], async {
                tokio::task::yield_now().await;
                "page"
            })
            .await;
        assert_eq!(value, "page");
        assert_eq!(
            memory.lines(),
            vec![">fetch( 7 )", "<fetch( 7 ) = \"page\""]
        );

        let result: std::result::Result<(), String> = tracer
            .try_call_async(&[], async { Err("timeout".to_string()) })
            .await;
        assert!(result.is_err());
        assert_eq!(memory.lines()[3], "<fetch() raised Err(\"timeout\")");
        Ok(())
    }

    #[test]
    fn test_dropped_future_is_cancelled() -> Result<()> {
        let (manager, memory) = setup("{padding}{funcName}{message}")?;
        let tracer = Tracer::function(manager.get_logger("net"), "wait");
        let future = tracer.call_async(&[], std::future::pending::<()>());
        drop(future);
        assert_eq!(memory.lines(), vec![">wait()", "<wait() cancelled"]);
        assert_eq!(manager.depth(), 0);
        Ok(())
    }
}
