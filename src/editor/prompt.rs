//! # 指令组装模块
//!
//! ## 设计思路
//!
//! 发往模型的最终文本由两层拼装：
//!
//! 1. `compose_instruction`：用户提示词 + 可选水印句子（五个固定位置）。
//! 2. `wrap_for_model`：固定包装语，要求服务只返回修改后的图片并保持宽高比。
//!
//! 水印文本为空白时忽略水印；提示词为空白而水印存在时，
//! 最终指令就是水印句子本身，开头不带任何分隔符。

use serde::{Deserialize, Serialize};

/// 水印的五个固定位置标签，IPC 侧使用 `top-left` 等 kebab-case 值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl WatermarkPosition {
    /// 嵌入句子的自然语言方位词（标签去掉连字符）。
    fn phrase(self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "top left",
            WatermarkPosition::TopRight => "top right",
            WatermarkPosition::BottomLeft => "bottom left",
            WatermarkPosition::BottomRight => "bottom right",
            WatermarkPosition::Center => "center",
        }
    }
}

/// 可选水印：文本 + 位置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub text: String,
    pub position: WatermarkPosition,
}

/// 组装最终编辑指令：用户提示词 + 可选水印句子。
pub fn compose_instruction(prompt: &str, watermark: Option<&WatermarkSpec>) -> String {
    let base = prompt.trim();
    let sentence = watermark.and_then(|wm| {
        let text = wm.text.trim();
        if text.is_empty() {
            None
        } else {
            Some(watermark_sentence(text, wm.position))
        }
    });

    match sentence {
        Some(sentence) if base.is_empty() => sentence,
        Some(sentence) => format!("{}. {}", base, sentence),
        None => base.to_string(),
    }
}

/// 固定包装语：指示服务只输出修改后的图片并保持宽高比。
pub fn wrap_for_model(instruction: &str) -> String {
    format!(
        "Output ONLY the modified image. Edit strictly following: {}. Maintain aspect ratio.",
        instruction
    )
}

fn watermark_sentence(text: &str, position: WatermarkPosition) -> String {
    format!(
        "Add a clearly visible text watermark saying \"{}\" in the {} corner of the image. \
         Ensure the text is legible and contrasts with the background.",
        text,
        position.phrase()
    )
}
