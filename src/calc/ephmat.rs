//! # `ephmat` 模式记录
//!
//! 固定一个 k 点，沿一组 q 点输出声子能量与形变势：
//!
//! ```yaml
//! ephmat:
//!   k-point coordinate units: crystal
//!   k-point coordinates: [0.0, 0.0, 0.0]
//!   q-point coordinate units: crystal
//!   q-point coordinates: [[...], ...]
//!   phonon energy units: meV
//!   phonon energy:
//!     1: [...]
//!   deformation potential units: eV/A
//!   deformation potential:
//!     1: [...]
//! ```
//!
//! 形变势的单位（eV/Å 等复合单位）不在单位表中，只保存原始字符串，不参与换算。

use super::header::read_vector3;
use super::{open_record, CalcHeader, CalcMode};
use crate::error::{EphError, Result};
use crate::models::lattice::{basis_transform, points_from_rows};
use crate::models::quantity::{QuantityKey, QuantityMap, QuantityValue};
use crate::models::recip::RecipPtDb;
use crate::models::units::{RecipBasis, UnitFamily};
use crate::parsers::yaml::{require, require_mapping, require_str};

use serde_yaml::Mapping;
use std::collections::BTreeMap;
use std::path::Path;

/// 电声矩阵元
#[derive(Debug, Clone)]
pub struct Ephmat {
    pub header: CalcHeader,
    /// 固定 k 点（crystal 坐标）
    pub kpoint: [f64; 3],
    pub qpt: RecipPtDb,
    /// 模式编号 → 各 q 点声子能量
    pub phonon_energies: QuantityMap,
    /// 模式编号 → 各 q 点形变势
    pub defpot: BTreeMap<QuantityKey, QuantityValue>,
    pub defpot_units: String,
}

impl Ephmat {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Ephmat)?;
        Ephmat::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "ephmat", origin)?;

        let k_unit = RecipBasis::canonicalize(require_str(block, "k-point coordinate units", origin)?)?;
        let k_raw = read_vector3(require(block, "k-point coordinates", origin)?, "k-point coordinates")?;
        let kpoint = match k_unit {
            RecipBasis::Crystal => k_raw,
            RecipBasis::Cartesian => {
                let k = basis_transform(
                    points_from_rows(&[k_raw]).view(),
                    header.lattice.view(),
                    header.recip_lattice.view(),
                    false,
                    false,
                );
                [k[[0, 0]], k[[1, 0]], k[[2, 0]]]
            }
        };

        let qpt = header.read_points(block, "q-point", origin)?;
        let phonon_energies = QuantityMap::from_yaml(
            require(block, "phonon energy", origin)?,
            UnitFamily::Energy,
            require_str(block, "phonon energy units", origin)?,
        )?;

        let defpot = match QuantityValue::from_yaml(
            require(block, "deformation potential", origin)?,
            "deformation potential",
        )? {
            QuantityValue::Map(m) => m,
            _ => {
                return Err(EphError::InvalidValue {
                    key: "deformation potential".to_string(),
                    reason: "expected a mapping of mode index to values".to_string(),
                })
            }
        };
        let defpot_units = require_str(block, "deformation potential units", origin)?.to_string();

        Ok(Ephmat {
            header,
            kpoint,
            qpt,
            phonon_energies,
            defpot,
            defpot_units,
        })
    }

    pub fn num_modes(&self) -> usize {
        self.phonon_energies.len()
    }

    /// 所有模式与 q 点中形变势的最大绝对值
    pub fn max_defpot(&self) -> Option<f64> {
        self.defpot
            .values()
            .filter_map(QuantityValue::max_abs)
            .reduce(f64::max)
    }
}
