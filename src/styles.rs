//! # 样式注册表模块
//!
//! ## 设计思路
//!
//! 已保存样式是一个扁平、只追加的命名提示词列表，
//! 整个列表序列化为应用数据目录下的单个 JSON 文件。
//! 没有更新与删除操作；每次保存全量重写。
//!
//! ## 实现思路
//!
//! - 核心读写函数以 `&Path` 为参数，测试可注入临时文件替身。
//! - 存量文件格式损坏时静默丢弃（只记 warn 日志），按空列表处理。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};

use crate::error::AppError;
use crate::library::generate_id;

const STYLES_FILE_NAME: &str = "styles.json";

/// 一条命名的可复用提示词，保存后不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditingStyle {
    pub id: String,
    pub name: String,
    pub prompt: String,
}

fn styles_file_path(app: &AppHandle) -> Result<PathBuf, AppError> {
    let app_data_dir = app
        .path()
        .app_data_dir()
        .map_err(|e| AppError::Storage(format!("获取应用数据目录失败: {}", e)))?;

    fs::create_dir_all(&app_data_dir)
        .map_err(|e| AppError::Storage(format!("创建应用数据目录失败: {}", e)))?;

    Ok(app_data_dir.join(STYLES_FILE_NAME))
}

/// 读取样式列表；文件缺失或格式损坏时返回空列表。
pub fn load_styles_from_path(path: &Path) -> Vec<EditingStyle> {
    if !path.exists() {
        return Vec::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("⚠️ 读取样式文件失败，按空列表处理: {}", err);
            return Vec::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(styles) => styles,
        Err(err) => {
            log::warn!("⚠️ 样式文件格式无效，已丢弃存量内容: {}", err);
            Vec::new()
        }
    }
}

/// 追加一条样式并全量重写文件，返回新建的样式。
pub fn append_style_at_path(path: &Path, name: &str, prompt: &str) -> Result<EditingStyle, AppError> {
    let name = name.trim();
    let prompt = prompt.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("样式名称不能为空".to_string()));
    }
    if prompt.is_empty() {
        return Err(AppError::InvalidInput("样式提示词不能为空".to_string()));
    }

    let mut styles = load_styles_from_path(path);
    let style = EditingStyle {
        id: generate_id(),
        name: name.to_string(),
        prompt: prompt.to_string(),
    };
    styles.push(style.clone());

    let content = serde_json::to_string_pretty(&styles)
        .map_err(|e| AppError::Storage(format!("序列化样式失败: {}", e)))?;
    fs::write(path, content)?;

    log::info!("💾 样式已保存 - {}（共 {} 条）", style.name, styles.len());
    Ok(style)
}

/// 读取已保存的样式列表。
#[tauri::command]
pub fn get_saved_styles(app: AppHandle) -> Result<Vec<EditingStyle>, AppError> {
    let path = styles_file_path(&app)?;
    Ok(load_styles_from_path(&path))
}

/// 保存一条新样式。
#[tauri::command]
pub fn save_style(app: AppHandle, name: String, prompt: String) -> Result<EditingStyle, AppError> {
    let path = styles_file_path(&app)?;
    append_style_at_path(&path, &name, &prompt)
}
