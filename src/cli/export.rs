//! # export 子命令 CLI 定义
//!
//! 将能带或声子色散导出为 CSV
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/export.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 导出时使用的坐标基
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BasisArg {
    /// Fractional coordinates of the reciprocal lattice vectors
    Crystal,
    /// Cartesian coordinates in units of 2π/alat
    Cartesian,
}

impl std::fmt::Display for BasisArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasisArg::Crystal => write!(f, "crystal"),
            BasisArg::Cartesian => write!(f, "cartesian"),
        }
    }
}

/// export 子命令参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Bands or phdisp YAML file
    pub input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "dispersion.csv")]
    pub output: PathBuf,

    /// Energy unit of the exported values (eV, meV, Ry, Ha, THz, cm-1, ...)
    #[arg(short, long)]
    pub energy_unit: Option<String>,

    /// Coordinate basis of the exported points
    #[arg(short, long, value_enum, default_value_t = BasisArg::Crystal)]
    pub basis: BasisArg,
}
