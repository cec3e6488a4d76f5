//! # info 子命令 CLI 定义
//!
//! 显示计算记录摘要
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/info.rs`

use clap::Args;
use std::path::PathBuf;

/// info 子命令参数
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Calculation output YAML file
    pub input: PathBuf,

    /// Energy unit used in the summary
    #[arg(short, long)]
    pub energy_unit: Option<String>,
}
