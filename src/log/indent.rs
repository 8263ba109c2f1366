use crate::log::error::{LogError, LogResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 缩进深度
///
/// 同一个 LoggerManager 下的所有 logger 共享一个实例。深度不会小于 0，
/// 并发更新不会丢失，但不同线程的输出行会交错。
#[derive(Debug, Default)]
pub struct IndentState {
    depth: AtomicUsize,
}

impl IndentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// 深度加一，返回新的深度
    pub fn increment(&self) -> usize {
        self.depth.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 深度减一，返回新的深度；已为 0 时保持不变并返回 `ImbalancedIndent`
    pub fn decrement(&self) -> LogResult<usize> {
        self.depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1))
            .map(|previous| previous - 1)
            .map_err(|_| LogError::ImbalancedIndent)
    }

    pub fn reset(&self) {
        self.depth.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_decrement() {
        let state = IndentState::new();
        assert_eq!(state.increment(), 1);
        assert_eq!(state.increment(), 2);
        assert_eq!(state.decrement(), Ok(1));
        assert_eq!(state.decrement(), Ok(0));
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn test_underflow_clamped() {
        let state = IndentState::new();
        assert_eq!(state.decrement(), Err(LogError::ImbalancedIndent));
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn test_concurrent_updates_not_lost() {
        let state = Arc::new(IndentState::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        state.increment();
                    }
                    for _ in 0..500 {
                        let _ = state.decrement();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(state.depth(), 8 * 500);
    }
}
