//! # 计算模式记录
//!
//! 模拟程序按计算模式（`calc_mode`）输出不同结构的 YAML。
//! 每种模式对应一个记录类型，从通用 YAML 树中抽取特定键，
//! 包装成 [`QuantityMap`](crate::models::QuantityMap) 与
//! [`RecipPtDb`](crate::models::RecipPtDb)。
//!
//! | 模式 | 记录 | 内容 |
//! |------|------|------|
//! | `bands` | [`Bands`] | k 点 + 能带 |
//! | `phdisp` | [`Phdisp`] | q 点 + 声子色散 |
//! | `ephmat` | [`Ephmat`] | 固定 k 点、q 点、声子能量、形变势 |
//! | `imsigma` | [`Imsigma`] | 各构型的温度/化学势与自能虚部 |
//! | `trans` | [`Trans`] | 各构型的温度/化学势/载流子浓度与电导率张量 |
//! | `dynamics-run` | [`Dynamics`] | 时间轴与 HDF5 快照文件 |
//!
//! 记录的 `from_yaml(path)` 在文件不存在时报 `FileNotFound`，
//! 声明的模式与记录类型不符时报 `InvalidCalcMode`。
//!
//! ## 依赖关系
//! - 被 `commands/export.rs`, `commands/info.rs` 使用
//! - 使用 `models/`, `parsers/yaml.rs`

pub mod bands;
pub mod dynamics;
pub mod ephmat;
pub mod header;
pub mod imsigma;
pub mod phdisp;
pub mod trans;

pub use bands::Bands;
pub use dynamics::Dynamics;
pub use ephmat::Ephmat;
pub use header::CalcHeader;
pub use imsigma::Imsigma;
pub use phdisp::Phdisp;
pub use trans::Trans;

use crate::error::{EphError, Result};
use crate::parsers::yaml::{read_yaml_file, require_mapping, require_str};

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;

/// 计算模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalcMode {
    Bands,
    Phdisp,
    Ephmat,
    Imsigma,
    Trans,
    Dynamics,
}

impl CalcMode {
    /// 模拟程序使用的模式名
    pub fn name(&self) -> &'static str {
        match self {
            CalcMode::Bands => "bands",
            CalcMode::Phdisp => "phdisp",
            CalcMode::Ephmat => "ephmat",
            CalcMode::Imsigma => "imsigma",
            CalcMode::Trans => "trans",
            CalcMode::Dynamics => "dynamics-run",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bands" => Some(CalcMode::Bands),
            "phdisp" => Some(CalcMode::Phdisp),
            "ephmat" => Some(CalcMode::Ephmat),
            "imsigma" => Some(CalcMode::Imsigma),
            "trans" => Some(CalcMode::Trans),
            "dynamics-run" => Some(CalcMode::Dynamics),
            _ => None,
        }
    }

    /// 读取 `input parameters → calc_mode`
    pub fn detect(root: &Mapping, origin: &str) -> Result<Self> {
        let params = require_mapping(root, "input parameters", origin)?;
        let name = require_str(params, "calc_mode", origin)?;
        CalcMode::from_name(name).ok_or_else(|| EphError::InvalidCalcMode {
            expected: "one of bands, phdisp, ephmat, imsigma, trans, dynamics-run".to_string(),
            found: name.to_string(),
        })
    }
}

impl fmt::Display for CalcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 读取文件并检查声明的模式，返回顶层映射
pub(crate) fn open_record(path: &Path, expected: CalcMode) -> Result<Mapping> {
    let value = read_yaml_file(path)?;
    let root = into_root(value, &path.display().to_string())?;
    check_mode(&root, expected, &path.display().to_string())?;
    Ok(root)
}

pub(crate) fn into_root(value: Value, origin: &str) -> Result<Mapping> {
    match value {
        Value::Mapping(m) => Ok(m),
        _ => Err(EphError::ParseError {
            format: "yaml".to_string(),
            path: origin.to_string(),
            reason: "top level is not a mapping".to_string(),
        }),
    }
}

pub(crate) fn check_mode(root: &Mapping, expected: CalcMode, origin: &str) -> Result<()> {
    let params = require_mapping(root, "input parameters", origin)?;
    let found = require_str(params, "calc_mode", origin)?;
    if found != expected.name() {
        return Err(EphError::InvalidCalcMode {
            expected: expected.name().to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

/// 任意模式的记录
#[derive(Debug, Clone)]
pub enum CalcRecord {
    Bands(Bands),
    Phdisp(Phdisp),
    Ephmat(Ephmat),
    Imsigma(Imsigma),
    Trans(Trans),
    Dynamics(Dynamics),
}

impl CalcRecord {
    pub fn mode(&self) -> CalcMode {
        match self {
            CalcRecord::Bands(_) => CalcMode::Bands,
            CalcRecord::Phdisp(_) => CalcMode::Phdisp,
            CalcRecord::Ephmat(_) => CalcMode::Ephmat,
            CalcRecord::Imsigma(_) => CalcMode::Imsigma,
            CalcRecord::Trans(_) => CalcMode::Trans,
            CalcRecord::Dynamics(_) => CalcMode::Dynamics,
        }
    }

    pub fn header(&self) -> &CalcHeader {
        match self {
            CalcRecord::Bands(r) => &r.header,
            CalcRecord::Phdisp(r) => &r.header,
            CalcRecord::Ephmat(r) => &r.header,
            CalcRecord::Imsigma(r) => &r.header,
            CalcRecord::Trans(r) => &r.header,
            CalcRecord::Dynamics(r) => &r.header,
        }
    }
}

/// 自动识别模式并读取记录
pub fn load_record(path: &Path) -> Result<CalcRecord> {
    let origin = path.display().to_string();
    let root = into_root(read_yaml_file(path)?, &origin)?;
    let mode = CalcMode::detect(&root, &origin)?;
    log::debug!("{}: calc_mode = {}", origin, mode);

    let record = match mode {
        CalcMode::Bands => CalcRecord::Bands(Bands::from_root(&root, &origin)?),
        CalcMode::Phdisp => CalcRecord::Phdisp(Phdisp::from_root(&root, &origin)?),
        CalcMode::Ephmat => CalcRecord::Ephmat(Ephmat::from_root(&root, &origin)?),
        CalcMode::Imsigma => CalcRecord::Imsigma(Imsigma::from_root(&root, &origin)?),
        CalcMode::Trans => CalcRecord::Trans(Trans::from_root(&root, &origin)?),
        CalcMode::Dynamics => CalcRecord::Dynamics(Dynamics::from_root(&root, &origin)?),
    };
    Ok(record)
}
