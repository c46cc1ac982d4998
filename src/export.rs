//! # 归档导出模块
//!
//! ## 设计思路
//!
//! 收集所有 `Completed` 且带结果负载的条目，解码 data URL 负载后
//! 打成一个 zip 压缩包。成员命名为原文件名去扩展名加
//! `_edited_{序号}.png`，归档名携带当天日期。
//!
//! ## 实现思路
//!
//! - 打包在内存中完成（`Cursor<Vec<u8>>`），逐成员回调 0–100 的进度。
//! - 无可导出内容 / 负载解码失败 / 压缩出错分别映射为独立错误分支，
//!   全部只作为提示返回前端，不影响已完成条目的状态。
//! - 命令层把归档写入用户下载目录，取不到时回退应用数据目录。

use std::io::{Cursor, Write};
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use chrono::NaiveDate;
use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State, Wry};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::AppError;
use crate::library::{ImageStatus, LibraryState};

pub const EXPORT_PROGRESS_EVENT: &str = "export-progress";

/// 成员文件统一输出扩展名。
const OUTPUT_EXTENSION: &str = "png";

/// 归档导出统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// 没有 `Completed` 且带结果的条目
    #[error("没有已完成的图片可供导出")]
    NothingToExport,

    /// 结果负载不是合法的 Base64 data URL
    #[error("结果数据无效：{0}")]
    InvalidPayload(String),

    /// zip 写入或收尾失败
    #[error("压缩打包失败：{0}")]
    Packaging(String),
}

/// 参与导出筛选的条目视图。
#[derive(Debug, Clone)]
pub struct ExportSource {
    pub file_name: String,
    pub status: ImageStatus,
    pub result_data_url: Option<String>,
}

/// 打包完成的归档内容。
#[derive(Debug)]
pub struct ExportedArchive {
    pub bytes: Vec<u8>,
    pub entry_count: usize,
}

/// 归档文件名：`BananaBatch_<ISO 日期>.zip`。
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("BananaBatch_{}.zip", date.format("%Y-%m-%d"))
}

/// 从 data URL 中解出原始字节（容忍纯 Base64 输入）。
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, ExportError> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(data_url);

    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ExportError::InvalidPayload(format!("Base64 解码失败：{}", e)))
}

/// 成员名：原文件名去扩展名 + `_edited_{1 起序号}.png`。
fn member_name(file_name: &str, index: usize) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name);

    format!("{}_edited_{}.{}", stem, index + 1, OUTPUT_EXTENSION)
}

/// 把全部合格条目打成一个 zip，逐成员回调打包进度（0–100）。
pub fn build_archive<F>(sources: &[ExportSource], mut on_progress: F) -> Result<ExportedArchive, ExportError>
where
    F: FnMut(f64),
{
    let completed: Vec<&ExportSource> = sources
        .iter()
        .filter(|source| {
            source.status == ImageStatus::Completed
                && source
                    .result_data_url
                    .as_deref()
                    .is_some_and(|url| !url.is_empty())
        })
        .collect();

    if completed.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let total = completed.len();
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (index, source) in completed.iter().enumerate() {
        let data_url = source.result_data_url.as_deref().unwrap_or_default();
        let bytes = decode_data_url(data_url)?;

        writer
            .start_file(member_name(&source.file_name, index), options)
            .map_err(|e| ExportError::Packaging(e.to_string()))?;
        writer
            .write_all(&bytes)
            .map_err(|e| ExportError::Packaging(e.to_string()))?;

        on_progress((index + 1) as f64 * 100.0 / total as f64);
    }

    let cursor = writer
        .finish()
        .map_err(|e| ExportError::Packaging(e.to_string()))?;

    Ok(ExportedArchive {
        bytes: cursor.into_inner(),
        entry_count: total,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportProgressPayload {
    pub progress: f64,
}

/// 导出命令的返回：落盘路径 + 归档名 + 成员数。
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: String,
    pub file_name: String,
    pub entry_count: usize,
}

/// 把所有已完成条目打包成 zip 并写入下载目录。
#[tauri::command]
pub async fn export_archive(
    app: AppHandle<Wry>,
    library: State<'_, LibraryState>,
) -> Result<ExportResult, AppError> {
    let sources: Vec<ExportSource> = library
        .summaries()?
        .into_iter()
        .map(|summary| ExportSource {
            file_name: summary.file_name,
            status: summary.status,
            result_data_url: summary.result_data_url,
        })
        .collect();

    let archive = build_archive(&sources, |progress| {
        if let Err(err) = app.emit(EXPORT_PROGRESS_EVENT, ExportProgressPayload { progress }) {
            log::warn!("⚠️ 导出进度事件发送失败: {}", err);
        }
    })?;

    let file_name = archive_file_name(chrono::Local::now().date_naive());
    let dir = app
        .path()
        .download_dir()
        .or_else(|_| app.path().app_data_dir())
        .map_err(|e| AppError::Storage(format!("无法确定导出目录: {}", e)))?;
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(&file_name);
    std::fs::write(&path, &archive.bytes)?;

    log::info!(
        "📦 导出完成 - {} 个成员 → {}",
        archive.entry_count,
        path.display()
    );

    Ok(ExportResult {
        path: path.to_string_lossy().into_owned(),
        file_name,
        entry_count: archive.entry_count,
    })
}
