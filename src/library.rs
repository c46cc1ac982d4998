//! # 图片库模块
//!
//! ## 设计思路
//!
//! 图片集合由本模块唯一持有并唯一写入：批处理执行器只拿到待处理项的
//! 只读快照，状态变化以事件形式发回，由这里统一套用（单写者模型）。
//!
//! ## 实现思路
//!
//! - 导入时用 `infer` 嗅探字节判断媒体类型，非图片直接跳过。
//! - 导入上限 `MAX_IMAGES`，超出部分截断并在结果中报告数量。
//! - 每个条目生成一份预览文件作为展示句柄，移除条目时显式删除，
//!   避免预览目录无限增长。
//! - 状态机单向推进：`Pending → Processing → {Completed, Failed}`；
//!   已 `Completed` 的条目不会进入后续批处理队列。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager, State};

use crate::error::AppError;

/// 单次会话可导入的图片上限。
pub const MAX_IMAGES: usize = 20;

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成会话内唯一的条目 id（毫秒时间戳 + 单调序号）。
pub(crate) fn generate_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", millis, seq)
}

/// 条目处理状态，IPC 侧使用 `PENDING` 等大写值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// 一张导入图片及其处理生命周期。
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub id: String,
    pub file_name: String,
    pub media_type: String,
    /// 源字节不可变，条目间共享引用，快照零拷贝。
    pub bytes: Arc<Vec<u8>>,
    /// 预览文件句柄，移除条目时删除。
    pub preview_path: Option<PathBuf>,
    /// 编辑结果（data URL），仅 `Completed` 时存在。
    pub result_data_url: Option<String>,
    pub status: ImageStatus,
    pub error: Option<String>,
}

/// 发往前端的条目摘要（不含源字节）。
#[derive(Debug, Clone, Serialize)]
pub struct ImageItemSummary {
    pub id: String,
    pub file_name: String,
    pub media_type: String,
    pub status: ImageStatus,
    pub preview_path: Option<String>,
    pub result_data_url: Option<String>,
    pub error: Option<String>,
}

impl ImageItemSummary {
    fn from_item(item: &ImageItem) -> Self {
        Self {
            id: item.id.clone(),
            file_name: item.file_name.clone(),
            media_type: item.media_type.clone(),
            status: item.status,
            preview_path: item
                .preview_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            result_data_url: item.result_data_url.clone(),
            error: item.error.clone(),
        }
    }
}

/// 导入结果：新增条目 + 各类跳过数量，由前端决定如何提示。
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub added: Vec<ImageItemSummary>,
    /// 超出 `MAX_IMAGES` 被截断的数量
    pub skipped_over_limit: usize,
    /// 嗅探结果不是图片的数量
    pub skipped_not_image: usize,
    /// 读取失败的数量
    pub skipped_unreadable: usize,
}

/// 图片库托管状态。
pub struct LibraryState {
    items: Mutex<Vec<ImageItem>>,
    preview_dir: PathBuf,
}

impl LibraryState {
    /// 创建图片库，预览目录不存在时自动建立。
    pub fn new(preview_dir: PathBuf) -> Result<Self, AppError> {
        fs::create_dir_all(&preview_dir)
            .map_err(|e| AppError::Storage(format!("创建预览目录失败: {}", e)))?;

        Ok(Self {
            items: Mutex::new(Vec::new()),
            preview_dir,
        })
    }

    fn lock_items(&self) -> Result<std::sync::MutexGuard<'_, Vec<ImageItem>>, AppError> {
        self.items
            .lock()
            .map_err(|_| AppError::Storage("图片列表锁已中毒".to_string()))
    }

    /// 导入一批文件：嗅探媒体类型、写预览文件、按上限截断。
    pub fn import_paths(&self, paths: &[PathBuf]) -> Result<ImportOutcome, AppError> {
        let mut outcome = ImportOutcome {
            added: Vec::new(),
            skipped_over_limit: 0,
            skipped_not_image: 0,
            skipped_unreadable: 0,
        };

        let mut items = self.lock_items()?;
        let mut remaining = MAX_IMAGES.saturating_sub(items.len());

        for path in paths {
            if remaining == 0 {
                outcome.skipped_over_limit += 1;
                continue;
            }

            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("⚠️ 读取文件失败，已跳过 - {}: {}", path.display(), err);
                    outcome.skipped_unreadable += 1;
                    continue;
                }
            };

            let Some(kind) = infer::get(&bytes) else {
                outcome.skipped_not_image += 1;
                continue;
            };
            if !kind.mime_type().starts_with("image/") {
                outcome.skipped_not_image += 1;
                continue;
            }

            let id = generate_id();
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.{}", id, kind.extension()));

            let preview_path = match self.write_preview(&id, kind.extension(), &bytes) {
                Ok(path) => Some(path),
                Err(err) => {
                    // 预览缺失不阻止导入，前端回退展示占位图
                    log::warn!("⚠️ 写入预览文件失败 - {}: {}", file_name, err);
                    None
                }
            };

            let item = ImageItem {
                id,
                file_name,
                media_type: kind.mime_type().to_string(),
                bytes: Arc::new(bytes),
                preview_path,
                result_data_url: None,
                status: ImageStatus::Pending,
                error: None,
            };

            outcome.added.push(ImageItemSummary::from_item(&item));
            items.push(item);
            remaining -= 1;
        }

        log::info!(
            "🖼️ 导入完成 - added={} over_limit={} not_image={} unreadable={} total={}",
            outcome.added.len(),
            outcome.skipped_over_limit,
            outcome.skipped_not_image,
            outcome.skipped_unreadable,
            items.len()
        );

        Ok(outcome)
    }

    fn write_preview(&self, id: &str, extension: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.preview_dir.join(format!("{}.{}", id, extension));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// 移除单个条目并释放其预览文件。
    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let mut items = self.lock_items()?;
        let Some(index) = items.iter().position(|item| item.id == id) else {
            return Ok(false);
        };

        let item = items.remove(index);
        release_preview(&item);
        Ok(true)
    }

    /// 清空所有条目并释放全部预览文件。
    pub fn clear(&self) -> Result<(), AppError> {
        let mut items = self.lock_items()?;
        for item in items.iter() {
            release_preview(item);
        }
        items.clear();
        Ok(())
    }

    /// 全量条目摘要（列表刷新与导出筛选共用）。
    pub fn summaries(&self) -> Result<Vec<ImageItemSummary>, AppError> {
        let items = self.lock_items()?;
        Ok(items.iter().map(ImageItemSummary::from_item).collect())
    }

    /// 待处理队列快照：按当前顺序取 `status != Completed` 的条目。
    ///
    /// 快照是值拷贝（字节为 `Arc` 共享），批处理开始后新增的条目不在本轮队列中。
    pub fn pending_snapshot(&self) -> Result<Vec<ImageItem>, AppError> {
        let items = self.lock_items()?;
        Ok(items
            .iter()
            .filter(|item| item.status != ImageStatus::Completed)
            .cloned()
            .collect())
    }

    /// 取单个条目的源字节与媒体类型（单图预览用）。
    pub fn source_of(&self, id: &str) -> Result<(Arc<Vec<u8>>, String), AppError> {
        let items = self.lock_items()?;
        items
            .iter()
            .find(|item| item.id == id)
            .map(|item| (Arc::clone(&item.bytes), item.media_type.clone()))
            .ok_or_else(|| AppError::InvalidInput(format!("图片不存在: {}", id)))
    }

    /// 套用一条状态更新事件（单写者入口）。
    ///
    /// 条目在运行期间被用户移除时更新会落空，直接忽略。
    pub fn apply_status(
        &self,
        id: &str,
        status: ImageStatus,
        result_data_url: Option<String>,
        error: Option<String>,
    ) -> Result<(), AppError> {
        let mut items = self.lock_items()?;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.status = status;
            if result_data_url.is_some() {
                item.result_data_url = result_data_url;
            }
            item.error = error;
        }
        Ok(())
    }
}

fn release_preview(item: &ImageItem) {
    if let Some(path) = &item.preview_path {
        if let Err(err) = fs::remove_file(path) {
            log::warn!("⚠️ 删除预览文件失败 - {}: {}", path.display(), err);
        }
    }
}

/// 导入前端选择的文件列表。
#[tauri::command]
pub fn import_images(
    state: State<'_, LibraryState>,
    paths: Vec<String>,
) -> Result<ImportOutcome, AppError> {
    if paths.is_empty() {
        return Err(AppError::InvalidInput("未选择任何文件".to_string()));
    }

    let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
    state.import_paths(&paths)
}

/// 获取当前全部条目摘要。
#[tauri::command]
pub fn list_images(state: State<'_, LibraryState>) -> Result<Vec<ImageItemSummary>, AppError> {
    state.summaries()
}

/// 移除单个条目（同时释放预览文件）。
#[tauri::command]
pub fn remove_image(state: State<'_, LibraryState>, id: String) -> Result<bool, AppError> {
    state.remove(&id)
}

/// 清空全部条目。
#[tauri::command]
pub fn clear_images(state: State<'_, LibraryState>) -> Result<(), AppError> {
    state.clear()
}

/// 计算应用预览目录（app 数据目录下的 `previews` 子目录）。
pub fn preview_dir(app: &AppHandle) -> Result<PathBuf, AppError> {
    let app_data_dir = app
        .path()
        .app_data_dir()
        .map_err(|e| AppError::Storage(format!("获取应用数据目录失败: {}", e)))?;
    Ok(app_data_dir.join("previews"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn write_test_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, create_png_bytes(8, 8)).expect("failed to write test image");
        path
    }

    fn library_in(dir: &TempDir) -> LibraryState {
        LibraryState::new(dir.path().join("previews")).expect("library init failed")
    }

    #[test]
    fn import_creates_pending_items_with_previews() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);
        let path = write_test_image(dir.path(), "photo.png");

        let outcome = library.import_paths(&[path]).expect("import failed");

        assert_eq!(outcome.added.len(), 1);
        let added = &outcome.added[0];
        assert_eq!(added.file_name, "photo.png");
        assert_eq!(added.media_type, "image/png");
        assert_eq!(added.status, ImageStatus::Pending);

        let preview = added.preview_path.as_ref().expect("preview expected");
        assert!(Path::new(preview).exists());
    }

    #[test]
    fn import_skips_non_image_files() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"just some text, definitely not pixels").expect("write failed");

        let outcome = library.import_paths(&[path]).expect("import failed");

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.skipped_not_image, 1);
    }

    #[test]
    fn import_truncates_at_max_images() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);

        let paths: Vec<PathBuf> = (0..MAX_IMAGES + 3)
            .map(|i| write_test_image(dir.path(), &format!("photo_{}.png", i)))
            .collect();

        let outcome = library.import_paths(&paths).expect("import failed");

        assert_eq!(outcome.added.len(), MAX_IMAGES);
        assert_eq!(outcome.skipped_over_limit, 3);
        assert_eq!(
            library.summaries().expect("summaries failed").len(),
            MAX_IMAGES
        );
    }

    #[test]
    fn remove_releases_preview_file() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);
        let path = write_test_image(dir.path(), "photo.png");

        let outcome = library.import_paths(&[path]).expect("import failed");
        let added = &outcome.added[0];
        let preview = PathBuf::from(added.preview_path.as_ref().expect("preview expected"));
        assert!(preview.exists());

        assert!(library.remove(&added.id).expect("remove failed"));
        assert!(!preview.exists());
        assert!(library.summaries().expect("summaries failed").is_empty());
    }

    #[test]
    fn pending_snapshot_excludes_completed_items() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);
        let paths = [
            write_test_image(dir.path(), "a.png"),
            write_test_image(dir.path(), "b.png"),
        ];

        let outcome = library.import_paths(&paths).expect("import failed");
        let first_id = outcome.added[0].id.clone();

        library
            .apply_status(
                &first_id,
                ImageStatus::Completed,
                Some("data:image/png;base64,QUJD".to_string()),
                None,
            )
            .expect("apply failed");

        let snapshot = library.pending_snapshot().expect("snapshot failed");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].file_name, "b.png");
    }

    #[test]
    fn apply_status_on_removed_item_is_ignored() {
        let dir = TempDir::new().expect("tempdir failed");
        let library = library_in(&dir);

        library
            .apply_status("gone", ImageStatus::Failed, None, Some("late".to_string()))
            .expect("apply should not fail for missing items");
        assert!(library.summaries().expect("summaries failed").is_empty());
    }
}
