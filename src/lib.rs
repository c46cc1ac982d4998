//! # BananaBatch — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前端 (React + TypeScript)                │
//! │                                                          │
//! │  图片网格 ── 编辑弹层 ── 进度遮罩 ── 下载按钮              │
//! │       │  (统一错误处理 + 类型安全)                       │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Tauri IPC (Result<T, AppError> + 事件流)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ──────  AppError (统一错误类型)                 │
//! │  │                                                       │
//! │  ├─ library ────  图片集合唯一持有者 (单写者)              │
//! │  │                导入上限 / 预览句柄 / 待处理快照          │
//! │  │                                                       │
//! │  ├─ editor ─────  Gemini 单次编辑调用                     │
//! │  │   ├─ prompt        包装语 + 水印句子                    │
//! │  │   └─ client        REST 请求·内联图片解析               │
//! │  │                                                       │
//! │  ├─ batch ──────  串行批处理 (协作式取消·事件流)           │
//! │  ├─ export ─────  zip 归档打包 (进度回调)                 │
//! │  └─ styles ─────  只追加样式注册表 (JSON 文件)             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有 Tauri command 的返回类型 |
//! | [`library`] | 图片集合的导入、移除、状态套用与队列快照 |
//! | [`editor`] | 云端单次编辑调用与指令组装，`ImageEditor` 契约 |
//! | [`batch`] | 串行批处理执行器、运行门闩与协作式取消 |
//! | [`export`] | 已完成结果打包为 zip 并写入下载目录 |
//! | [`styles`] | 命名提示词的只追加持久化注册表 |

pub mod error;
pub mod batch;
pub mod editor;
pub mod export;
pub mod library;
pub mod styles;
