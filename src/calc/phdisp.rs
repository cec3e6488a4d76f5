//! # `phdisp` 模式记录
//!
//! 与 `bands` 结构相同，点集为 q 点，数值为各声子模式的能量：
//!
//! ```yaml
//! phdisp:
//!   q-point coordinate units: crystal
//!   q-point coordinates: [[...], ...]
//!   phonon energy units: meV
//!   phonon mode:
//!     1: [...]
//! ```

use super::bands::{min_max, read_dispersion};
use super::{open_record, CalcHeader, CalcMode};
use crate::error::Result;
use crate::models::quantity::QuantityMap;
use crate::models::recip::RecipPtDb;
use crate::parsers::yaml::require_mapping;

use serde_yaml::Mapping;
use std::path::Path;

/// 声子色散
#[derive(Debug, Clone)]
pub struct Phdisp {
    pub header: CalcHeader,
    pub qpt: RecipPtDb,
    /// 模式编号 → 各 q 点声子能量
    pub phdisp: QuantityMap,
}

impl Phdisp {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Phdisp)?;
        Phdisp::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "phdisp", origin)?;
        let (qpt, phdisp) = read_dispersion(
            &header,
            block,
            "q-point",
            "phonon energy units",
            "phonon mode",
            origin,
        )?;
        Ok(Phdisp { header, qpt, phdisp })
    }

    pub fn num_modes(&self) -> usize {
        self.phdisp.len()
    }

    pub fn energy_range(&self) -> Option<(f64, f64)> {
        min_max(&self.phdisp)
    }
}
