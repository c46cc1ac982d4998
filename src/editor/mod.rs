//! # 云端图片编辑模块（editor）
//!
//! ## 设计思路
//!
//! 该模块将“指令组装 → 请求编码 → 单次调用 → 响应解析”按职责拆分：
//!
//! - `commands`：仅做 IPC 入参/出参适配（薄封装，单图预览入口）
//! - `client`：Gemini REST 客户端，一次请求换一张图
//! - `prompt`：固定包装语 + 水印句子的指令组装
//! - `error`：模块内统一错误类型
//! - `source`：输入/输出数据模型与 `ImageEditor` 契约
//!
//! ## 实现思路
//!
//! 调用方（批处理执行器、预览命令）只依赖 `ImageEditor` trait，
//! 测试时注入脚本化实现即可，无需真实网络。
//! 单次调用无内部重试、无超时：失败按条目上报，由调用方决定后续。

pub mod commands;
mod client;
mod error;
mod prompt;
mod source;

pub use client::GeminiEditor;
pub use error::EditError;
pub use prompt::{WatermarkPosition, WatermarkSpec, compose_instruction, wrap_for_model};
pub use source::{EditedImage, ImageEditor, SourceImage};
