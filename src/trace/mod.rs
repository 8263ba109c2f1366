//! 调用跟踪
//!
//! 进入被跟踪的调用时输出一条 TRACE 记录并增加缩进，退出时减少缩进并输出结果：
//!
//! ```text
//! >add( 2, 3 )
//! <add( 2, 3 ) = 5
//! ```
//!
//! 通常通过 `#[ftrace]`（函数）和 `#[ctrace]`（`impl` 块）使用，
//! 也可以直接使用 [`Tracer`] 和 [`Traced`]。
//! 是否跟踪在每次调用时决定：站点上的 `enabled` 优先，其次是全局开关。

mod flags;
pub mod repr;
mod traced;
mod tracer;

pub use flags::{TraceConfig, TraceFlags};
pub use repr::Outcome;
pub use traced::Traced;
pub use tracer::{CallGuard, CallSite, TraceKind, Tracer};
