//! # 批处理执行器
//!
//! ## 设计思路
//!
//! 严格串行地驱动编辑调用走完一份队列快照：任意时刻最多一张图在途。
//! 执行器不持有图片集合，只发出不可变的状态事件，
//! 由集合的持有者（图片库）统一套用，避免并发写。
//!
//! ## 实现思路
//!
//! - 取消令牌仅在条目边界轮询（协作式）：在途调用不会被打断，
//!   完成或失败后停止才生效。
//! - 单张失败只记日志并标记 `Failed`，不中断整轮处理。
//! - 进度计数按“尝试次数”递增，成功失败均计入。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::editor::{ImageEditor, SourceImage};
use crate::library::{ImageItem, ImageStatus};

/// 协作式取消令牌。
///
/// 可随时置位，执行器仅在两张图之间检查；一轮运行开始与结束时都会复位。
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 执行器对外发出的不可变事件。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// 单个条目的状态变化
    ItemStatus {
        id: String,
        status: ImageStatus,
        result_data_url: Option<String>,
        error: Option<String>,
    },
    /// 进度计数（current 按尝试次数递增）
    Progress { current: usize, total: usize },
}

/// 一轮批处理的汇总结果。
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// 串行批处理执行器，泛型于编辑实现以便测试注入。
pub struct BatchRunner<E> {
    editor: E,
}

impl<E: ImageEditor> BatchRunner<E> {
    pub fn new(editor: E) -> Self {
        Self { editor }
    }

    /// 对一份队列快照逐项执行编辑。
    ///
    /// 前置条件：`instruction` 去除空白后非空，否则整轮为空操作。
    /// 无论耗尽还是取消，返回前都会复位取消令牌。
    pub async fn run<F>(
        &self,
        queue: &[ImageItem],
        instruction: &str,
        cancel: &CancelToken,
        mut on_event: F,
    ) -> BatchOutcome
    where
        F: FnMut(BatchEvent) + Send,
    {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            log::warn!("⚠️ 批处理指令为空，跳过本轮");
            return BatchOutcome::default();
        }

        let total = queue.len();
        let mut outcome = BatchOutcome {
            total,
            ..BatchOutcome::default()
        };

        cancel.reset();
        log::info!("🚀 批处理开始 - total={}", total);
        let run_start = Instant::now();

        for item in queue {
            if cancel.is_stopped() {
                outcome.cancelled = true;
                log::info!(
                    "⏹️ 批处理已取消 - attempted={}/{}",
                    outcome.attempted,
                    total
                );
                break;
            }

            on_event(BatchEvent::ItemStatus {
                id: item.id.clone(),
                status: ImageStatus::Processing,
                result_data_url: None,
                error: None,
            });

            let item_start = Instant::now();
            let edit_result = self
                .editor
                .edit(
                    SourceImage {
                        bytes: &item.bytes,
                        media_type: &item.media_type,
                    },
                    instruction,
                )
                .await;

            match edit_result {
                Ok(edited) => {
                    outcome.completed += 1;
                    log::info!(
                        "✅ 编辑完成 - {} elapsed={}ms",
                        item.file_name,
                        item_start.elapsed().as_millis()
                    );
                    on_event(BatchEvent::ItemStatus {
                        id: item.id.clone(),
                        status: ImageStatus::Completed,
                        result_data_url: Some(edited.data_url()),
                        error: None,
                    });
                }
                Err(err) => {
                    outcome.failed += 1;
                    log::warn!("⚠️ 编辑失败，继续后续条目 - {}: {}", item.file_name, err);
                    on_event(BatchEvent::ItemStatus {
                        id: item.id.clone(),
                        status: ImageStatus::Failed,
                        result_data_url: None,
                        error: Some(err.to_string()),
                    });
                }
            }

            outcome.attempted += 1;
            on_event(BatchEvent::Progress {
                current: outcome.attempted,
                total,
            });
        }

        cancel.reset();
        log::info!(
            "🏁 批处理结束 - attempted={} completed={} failed={} cancelled={} elapsed={}ms",
            outcome.attempted,
            outcome.completed,
            outcome.failed,
            outcome.cancelled,
            run_start.elapsed().as_millis()
        );

        outcome
    }
}
