//! # compare 子命令 CLI 定义
//!
//! 比较一对 YAML/HDF5 输出文件
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/compare.rs`

use clap::Args;
use std::path::PathBuf;

/// compare 子命令参数
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Reference file (.yml, .yaml, .h5, .hdf5)
    pub reference: PathBuf,

    /// Candidate file to check against the reference
    pub candidate: PathBuf,

    /// Tolerance policy file (YAML with 'ignore keywords', 'test keywords', 'tolerance')
    #[arg(short, long, env = "EPHKIT_POLICY")]
    pub policy: Option<PathBuf>,

    /// Compare top-level keys in parallel
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Write the full diff record to this YAML file
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}
