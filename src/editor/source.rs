//! # 数据模型与编辑契约
//!
//! ## 设计思路
//!
//! `ImageEditor` 是批处理执行器与具体服务实现之间的唯一接缝：
//! 执行器只认识“字节 + 媒体类型 + 指令 → 编辑结果”，
//! 生产环境注入 [`GeminiEditor`](super::GeminiEditor)，测试注入脚本化实现。

use std::future::Future;

use super::EditError;

/// 待编辑的源图片（借用视图，不转移所有权）。
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    pub bytes: &'a [u8],
    pub media_type: &'a str,
}

/// 编辑结果：Base64 负载 + 服务声明的媒体类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    /// Base64 编码的图片字节（不含 `data:` 前缀）
    pub data: String,
    /// 媒体类型，服务未声明时默认 `image/png`
    pub media_type: String,
}

impl EditedImage {
    /// 转为前端可直接展示的 data URL。
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// 单次图片编辑契约。
///
/// 约束：`instruction` 去除首尾空白后非空；`bytes` 非空。
/// 实现方不做内部重试，失败直接上报给调用方。
pub trait ImageEditor: Send + Sync {
    fn edit(
        &self,
        image: SourceImage<'_>,
        instruction: &str,
    ) -> impl Future<Output = Result<EditedImage, EditError>> + Send;
}

/// 允许以借用形式传入编辑器（批处理执行器持有 `&GeminiEditor`）。
impl<T: ImageEditor> ImageEditor for &T {
    fn edit(
        &self,
        image: SourceImage<'_>,
        instruction: &str,
    ) -> impl Future<Output = Result<EditedImage, EditError>> + Send {
        (*self).edit(image, instruction)
    }
}
