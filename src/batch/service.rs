//! # 批处理托管状态
//!
//! ## 设计思路
//!
//! 执行器本身是一次性的，跨命令共享的只有两样：
//! 运行门闩（拒绝重入的 `start`）与取消令牌（`stop` 随时可调）。
//! 作为 Tauri `State` 注入命令层，测试可独立创建实例。

use std::sync::atomic::{AtomicBool, Ordering};

use super::runner::CancelToken;

/// 批处理共享状态：运行门闩 + 取消令牌。
pub struct BatchState {
    running: AtomicBool,
    cancel: CancelToken,
}

impl BatchState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            cancel: CancelToken::new(),
        }
    }

    /// 占用运行门闩；已有批次在跑时返回 `false`（拒绝重入）。
    pub fn try_begin(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 释放运行门闩。
    pub fn finish(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 请求停止当前批次；空闲时无效果，返回是否实际置位。
    pub fn request_stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel.request_stop();
        true
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl Default for BatchState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_rejected_while_running() {
        let state = BatchState::new();

        assert!(state.try_begin());
        assert!(!state.try_begin());

        state.finish();
        assert!(state.try_begin());
    }

    #[test]
    fn stop_while_idle_has_no_effect() {
        let state = BatchState::new();

        assert!(!state.request_stop());
        assert!(!state.cancel_token().is_stopped());

        assert!(state.try_begin());
        assert!(state.request_stop());
        assert!(state.cancel_token().is_stopped());
    }
}
