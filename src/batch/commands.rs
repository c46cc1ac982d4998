//! # Tauri 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做 IPC 参数接收与结果返回，不承载业务逻辑。
//! `start_batch` 负责：组装指令 → 校验 → 占用门闩 → 取队列快照 →
//! 驱动执行器，并把每条事件同时套用到图片库（单写者）与转发给前端。

use tauri::{AppHandle, Emitter, State, Wry};

use super::runner::{BatchEvent, BatchOutcome, BatchRunner};
use super::service::BatchState;
use crate::editor::{GeminiEditor, WatermarkSpec, compose_instruction};
use crate::error::AppError;
use crate::library::LibraryState;

pub const BATCH_ITEM_STATUS_EVENT: &str = "batch-item-status";
pub const BATCH_PROGRESS_EVENT: &str = "batch-progress";

/// 对所有未完成条目执行同一编辑指令。
///
/// 已在运行时拒绝重入；队列为空时直接返回空结果。
#[tauri::command]
pub async fn start_batch(
    app: AppHandle<Wry>,
    batch: State<'_, BatchState>,
    library: State<'_, LibraryState>,
    editor: State<'_, GeminiEditor>,
    prompt: String,
    watermark: Option<WatermarkSpec>,
) -> Result<BatchOutcome, AppError> {
    let instruction = compose_instruction(&prompt, watermark.as_ref());
    if instruction.is_empty() {
        return Err(AppError::InvalidInput("编辑指令不能为空".to_string()));
    }

    if !batch.try_begin() {
        return Err(AppError::InvalidInput(
            "批处理已在运行，请先停止当前任务".to_string(),
        ));
    }

    let queue = match library.pending_snapshot() {
        Ok(queue) => queue,
        Err(err) => {
            batch.finish();
            return Err(err);
        }
    };

    let runner = BatchRunner::new(editor.inner());
    let outcome = runner
        .run(&queue, &instruction, batch.cancel_token(), |event| {
            if let BatchEvent::ItemStatus {
                id,
                status,
                result_data_url,
                error,
            } = &event
            {
                if let Err(err) =
                    library.apply_status(id, *status, result_data_url.clone(), error.clone())
                {
                    log::warn!("⚠️ 套用状态更新失败 - {}: {}", id, err);
                }
            }

            let event_name = match &event {
                BatchEvent::ItemStatus { .. } => BATCH_ITEM_STATUS_EVENT,
                BatchEvent::Progress { .. } => BATCH_PROGRESS_EVENT,
            };
            if let Err(err) = app.emit(event_name, &event) {
                log::warn!("⚠️ 事件发送失败 - {}: {}", event_name, err);
            }
        })
        .await;

    batch.finish();
    Ok(outcome)
}

/// 请求停止当前批次（协作式，在途的一张编辑完成后生效）。
#[tauri::command]
pub fn stop_batch(batch: State<'_, BatchState>) -> Result<bool, AppError> {
    let stopped = batch.request_stop();
    if stopped {
        log::info!("🛑 已请求停止批处理");
    }
    Ok(stopped)
}
