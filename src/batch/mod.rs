//! # 批量比较模块
//!
//! 测试框架的批量层：收集参考目录中的输出文件，
//! 与候选目录配对后并行比较。
//!
//! ## 功能
//! - 按模式收集文件并按相对路径配对
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/testsuite.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{FileCollector, FilePair};
pub use runner::{BatchResult, BatchRunner, ProcessResult};
