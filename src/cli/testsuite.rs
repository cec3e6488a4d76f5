//! # testsuite 子命令 CLI 定义
//!
//! 将参考目录中的每个文件与输出目录中同一相对路径的文件比较
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/testsuite.rs`

use clap::Args;
use std::path::PathBuf;

/// testsuite 子命令参数
#[derive(Args, Debug)]
pub struct TestsuiteArgs {
    /// Directory holding the reference outputs
    pub reference_dir: PathBuf,

    /// Directory holding the freshly computed outputs
    pub output_dir: PathBuf,

    /// Tolerance policy file applied to every pair
    #[arg(short, long, env = "EPHKIT_POLICY")]
    pub policy: Option<PathBuf>,

    /// Comma-separated glob patterns for reference files
    #[arg(long, default_value = "*.yml,*.yaml,*.h5,*.hdf5")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
