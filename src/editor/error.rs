//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载编辑链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//! 批处理执行器按条目捕获此类型，不会因单张失败中断整个队列。

/// 云端编辑统一错误类型。
///
/// 该类型会在命令层被上转为 `AppError`，最终透传给前端。
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// 输入无效（空指令 / 空图片 / 未配置 API Key）
    #[error("输入无效：{0}")]
    InvalidInput(String),

    /// 网络或服务调用失败
    #[error("网络错误：{0}")]
    Transport(String),

    /// 服务响应中不含内联图片（例如被安全过滤拦截）
    #[error("服务未返回图片，可能被安全过滤拦截")]
    NoImageReturned,
}
