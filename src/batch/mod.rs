//! # 批处理模块（batch）
//!
//! ## 设计思路
//!
//! 该模块将“命令入口 → 共享状态 → 串行执行”按职责拆分：
//!
//! - `commands`：IPC 适配 + 事件转发（薄封装）
//! - `service`：跨命令共享的运行门闩与取消令牌
//! - `runner`：核心串行循环，只依赖 `ImageEditor` 契约
//!
//! ## 实现思路
//!
//! 一轮运行的状态机是 `IDLE → RUNNING → IDLE`：
//! 队列耗尽或观察到取消都会收敛回空闲。
//! 执行器对图片集合只读，状态更新以事件流回到图片库统一套用。

pub mod commands;
mod runner;
mod service;

pub use runner::{BatchEvent, BatchOutcome, BatchRunner, CancelToken};
pub use service::BatchState;
