//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! 所有 `#[tauri::command]` 函数统一返回 `Result<T, AppError>`，
//! 前端通过 `Serialize` 获得结构化的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `EditError` / `ExportError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 Tauri IPC 要求。
//!
//! 本应用中没有任何错误是致命的：单张图片的编辑失败只标记该项为
//! `Failed`，导出与持久化失败只作为提示返回前端。

use serde::Serialize;

use crate::editor::EditError;
use crate::export::ExportError;

/// 应用级统一错误类型
///
/// 所有 Tauri command 均返回此类型，确保前端收到一致的错误格式。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 用户输入无效（空提示词、未选择文件、超出导入上限等）
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 云端图片编辑失败（网络 / 服务未返回图片）
    #[error("{0}")]
    Edit(#[from] EditError),

    /// 打包导出失败（无可导出内容 / 压缩出错）
    #[error("{0}")]
    Export(#[from] ExportError),

    /// 持久化存储不可用（样式文件 / 预览目录）
    #[error("存储错误: {0}")]
    Storage(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

/// Tauri IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
