// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # BananaBatch — 应用入口
//!
//! 本文件仅负责应用初始化与插件/命令注册。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use banana_batch::{batch, editor, export, library, styles};
use tauri::Manager;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        // 插件初始化（文件选择 / 保存对话框）
        .plugin(tauri_plugin_dialog::init())
        // 应用设置
        .setup(|app| {
            log::info!("setup: begin");

            let handle = app.handle().clone();
            match library::preview_dir(&handle).and_then(library::LibraryState::new) {
                Ok(library_state) => {
                    app.manage(library_state);
                    log::info!("setup: library state managed");
                }
                Err(err) => {
                    log::error!("setup: 图片库初始化失败，应用将以受限模式运行: {err}");
                }
            }

            app.manage(editor::GeminiEditor::from_env());
            app.manage(batch::BatchState::new());
            log::info!("setup: complete");

            Ok(())
        })
        // 注册所有 Tauri 命令
        .invoke_handler(tauri::generate_handler![
            // 图片库
            library::import_images,
            library::list_images,
            library::remove_image,
            library::clear_images,
            // 单图预览
            editor::commands::preview_edit,
            // 批处理
            batch::commands::start_batch,
            batch::commands::stop_batch,
            // 归档导出
            export::export_archive,
            // 样式注册表
            styles::get_saved_styles,
            styles::save_style,
        ])
        .run(tauri::generate_context!())
        .expect("运行 Tauri 应用时出错");
}
