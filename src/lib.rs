//! # ephkit - 电声耦合计算后处理与测试工具箱
//!
//! 读取电声输运程序按计算模式输出的 YAML/HDF5 文件，
//! 提供单位换算、倒空间点管理，以及带容差策略的回归比较。
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── calc/      (计算模式记录)
//!   │     ├── compare/   (数据树比较与容差策略)
//!   │     ├── batch/     (批量比较)
//!   │     ├── parsers/   (YAML / HDF5 读取)
//!   │     └── models/    (单位、晶格、物理量、倒空间点)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod calc;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;

pub use error::{EphError, Result};
