//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `compare`: 比较两个输出文件
//! - `testsuite`: 批量比较参考目录与输出目录
//! - `export`: 导出能带/声子色散为 CSV
//! - `info`: 显示计算记录摘要
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: compare, testsuite, export, info

pub mod compare;
pub mod export;
pub mod info;
pub mod testsuite;

use clap::{Parser, Subcommand};

/// ephkit - 电声输运计算的后处理与测试工具
#[derive(Parser)]
#[command(name = "ephkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Post-processing and testsuite toolkit for electron-phonon transport calculations",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Compare two YAML/HDF5 output files with tolerances
    Compare(compare::CompareArgs),

    /// Compare every reference file against the matching output file
    Testsuite(testsuite::TestsuiteArgs),

    /// Export a bands or phdisp record to CSV
    Export(export::ExportArgs),

    /// Show a summary of a calculation record
    Info(info::InfoArgs),
}
