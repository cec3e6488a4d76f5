//! # `bands` 模式记录
//!
//! ```yaml
//! bands:
//!   k-point coordinate units: crystal
//!   k-point coordinates: [[...], ...]
//!   k-path coordinate units: arbitrary     # 可选
//!   k-path coordinates: [...]              # 可选
//!   high symmetry points: {G: [...], ...}  # 可选，crystal 坐标
//!   energy units: eV
//!   band index:
//!     1: [...]                             # 每个 k 点一个能量
//! ```
//!
//! ## 依赖关系
//! - 被 `calc/mod.rs`, `calc/phdisp.rs`, `commands/` 使用

use super::{open_record, CalcHeader, CalcMode};
use crate::error::{EphError, Result};
use crate::models::quantity::{QuantityMap, QuantityValue};
use crate::models::recip::RecipPtDb;
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{require, require_mapping, require_str};

use serde_yaml::Mapping;
use std::path::Path;

/// 能带结构
#[derive(Debug, Clone)]
pub struct Bands {
    pub header: CalcHeader,
    pub kpt: RecipPtDb,
    /// 能带编号 → 各 k 点能量
    pub bands: QuantityMap,
}

impl Bands {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Bands)?;
        Bands::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "bands", origin)?;
        let (kpt, bands) = read_dispersion(&header, block, "k-point", "energy units", "band index", origin)?;
        Ok(Bands { header, kpt, bands })
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// 所有能带的 (最小, 最大) 能量
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        min_max(&self.bands)
    }
}

/// 读取“点集 + 每条色散线一组数值”的结构，`bands` 与 `phdisp` 共用
pub(crate) fn read_dispersion(
    header: &CalcHeader,
    block: &Mapping,
    point_prefix: &str,
    units_key: &str,
    values_key: &str,
    origin: &str,
) -> Result<(RecipPtDb, QuantityMap)> {
    let points = header.read_points(block, point_prefix, origin)?;
    let unit = require_str(block, units_key, origin)?;
    let values = QuantityMap::from_yaml(require(block, values_key, origin)?, UnitFamily::Energy, unit)?;

    for (key, value) in values.iter() {
        let n = value.as_array().map(|a| a.len());
        if n != Some(points.len()) {
            return Err(EphError::InvalidValue {
                key: format!("{}.{}", values_key, key),
                reason: format!(
                    "expected {} values (one per {}), got {}",
                    points.len(),
                    point_prefix,
                    value.leaf_count()
                ),
            });
        }
    }
    Ok((points, values))
}

/// 一层映射中所有数组叶子的 (最小, 最大)
pub(crate) fn min_max(values: &QuantityMap) -> Option<(f64, f64)> {
    values
        .iter()
        .filter_map(|(_, v)| match v {
            QuantityValue::Array(a) => a.iter().copied().reduce(f64::min).zip(a.iter().copied().reduce(f64::max)),
            QuantityValue::Scalar(x) => Some((*x, *x)),
            QuantityValue::Map(_) => None,
        })
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}
