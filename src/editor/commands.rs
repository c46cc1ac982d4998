//! # Tauri 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做 IPC 参数接收与结果返回，不承载业务逻辑。
//! 单图预览直接调用编辑客户端，不改动条目状态，
//! 结果由前端在弹层里临时展示。

use tauri::State;

use super::{GeminiEditor, ImageEditor, SourceImage, WatermarkSpec, compose_instruction};
use crate::error::AppError;
use crate::library::LibraryState;

/// 在单张图片上试用编辑指令，返回结果 data URL。
#[tauri::command]
pub async fn preview_edit(
    editor: State<'_, GeminiEditor>,
    library: State<'_, LibraryState>,
    id: String,
    prompt: String,
    watermark: Option<WatermarkSpec>,
) -> Result<String, AppError> {
    let instruction = compose_instruction(&prompt, watermark.as_ref());
    if instruction.is_empty() {
        return Err(AppError::InvalidInput("编辑指令不能为空".to_string()));
    }

    let (bytes, media_type) = library.source_of(&id)?;

    let edited = editor
        .edit(
            SourceImage {
                bytes: &bytes,
                media_type: &media_type,
            },
            &instruction,
        )
        .await?;

    Ok(edited.data_url())
}
