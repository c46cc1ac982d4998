//! # Gemini REST 客户端
//!
//! ## 设计思路
//!
//! 单次 `generateContent` 调用换一张编辑结果图：
//! 请求携带内联图片（Base64 + 媒体类型）与包装后的指令文本，
//! 响应中取第一个候选里的第一个内联图片部件。
//!
//! ## 实现思路
//!
//! - `reqwest::Client` 通过 `OnceCell` 惰性创建并复用，减少每次请求的初始化开销。
//! - 无内部重试、无超时：网络失败映射为 `Transport`，
//!   响应无图（如被安全过滤拦截）映射为 `NoImageReturned`，均由调用方按条目处理。
//! - API Key 从环境变量读取，缺失时在调用时报错，不阻塞应用启动。

use base64::{Engine as _, engine::general_purpose};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::{EditError, EditedImage, ImageEditor, SourceImage, wrap_for_model};

const GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_MEDIA_TYPE: &str = "image/png";
const ERROR_BODY_MAX_CHARS: usize = 200;

/// 云端编辑服务客户端。
///
/// 跨调用无状态，仅持有可复用的 HTTP 客户端句柄。
pub struct GeminiEditor {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    http: OnceCell<reqwest::Client>,
}

impl GeminiEditor {
    /// 从环境变量读取 API Key 创建客户端。
    ///
    /// Key 缺失不算启动错误：首次编辑调用时才会失败并提示配置。
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        if api_key.is_none() {
            log::warn!("⚠️ 未检测到 {}，云端编辑功能在配置前不可用", API_KEY_ENV);
        }

        Self {
            api_key,
            model: GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http: OnceCell::new(),
        }
    }

    /// 惰性获取复用的 HTTP 客户端。
    fn client(&self) -> Result<&reqwest::Client, EditError> {
        self.http.get_or_try_init(|| {
            reqwest::Client::builder()
                .build()
                .map_err(|e| EditError::Transport(format!("HTTP 客户端初始化失败：{}", e)))
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

impl ImageEditor for GeminiEditor {
    async fn edit(
        &self,
        image: SourceImage<'_>,
        instruction: &str,
    ) -> Result<EditedImage, EditError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(EditError::InvalidInput("编辑指令不能为空".to_string()));
        }
        if image.bytes.is_empty() {
            return Err(EditError::InvalidInput("图片内容为空".to_string()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EditError::InvalidInput(format!("未配置 {}", API_KEY_ENV)))?;

        let body = build_request(image, instruction);

        log::info!(
            "🍌 发起云端编辑请求 - model={} size={}KB type={}",
            self.model,
            image.bytes.len() / 1024,
            image.media_type
        );

        let response = self
            .client()?
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EditError::Transport(format!("请求发送失败：{}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EditError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_detail(&detail)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EditError::Transport(format!("响应解析失败：{}", e)))?;

        first_inline_image(parsed).ok_or(EditError::NoImageReturned)
    }
}

/// 组装请求体：内联图片部件在前，包装后的指令文本在后。
fn build_request(image: SourceImage<'_>, instruction: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: Some(image.media_type.to_string()),
                        data: general_purpose::STANDARD.encode(image.bytes),
                    }),
                },
                Part {
                    text: Some(wrap_for_model(instruction)),
                    inline_data: None,
                },
            ],
        }],
    }
}

/// 取第一个候选中的第一个非空内联图片部件。
///
/// 服务未声明媒体类型时回退为 `image/png`。
fn first_inline_image(response: GenerateContentResponse) -> Option<EditedImage> {
    let content = response.candidates.into_iter().next()?.content?;

    content.parts.into_iter().find_map(|part| {
        let inline = part.inline_data?;
        if inline.data.is_empty() {
            return None;
        }

        Some(EditedImage {
            data: inline.data,
            media_type: inline
                .mime_type
                .filter(|mime| !mime.is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        })
    })
}

/// 截断错误响应正文，避免日志与前端提示里出现超长内容。
fn truncate_detail(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.chars().count() <= ERROR_BODY_MAX_CHARS {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(ERROR_BODY_MAX_CHARS).collect();
    format!("{}…", truncated)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
