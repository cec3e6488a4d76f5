//! # 公共头部：`basic data`
//!
//! 每种计算模式的输出 YAML 都带有 `basic data` 块：
//!
//! ```yaml
//! basic data:
//!   alat: 10.26
//!   alat units: bohr
//!   lattice vectors:            # 行向量 a1, a2, a3（alat 单位）
//!     a1: [-0.5, 0.0, 0.5]
//!     a2: [0.0, 0.5, 0.5]
//!     a3: [-0.5, 0.5, 0.0]
//!   reciprocal lattice vectors: # 行向量 b1, b2, b3（2π/alat 单位）
//!     - [-1.0, -1.0, 1.0]
//!     - [1.0, 1.0, 1.0]
//!     - [-1.0, 1.0, -1.0]
//!   number of atoms in unit cell: 2
//!   atomic positions:
//!     - [0.0, 0.0, 0.0]
//!     - [0.25, 0.25, 0.25]
//! ```
//!
//! 基矢既可写成 `a1/a2/a3` 映射，也可写成三行列表；内部统一存为列向量。
//!
//! ## 依赖关系
//! - 被 `calc/` 各记录使用
//! - 使用 `models/recip.rs`, `models/units.rs`, `parsers/yaml.rs`

use crate::error::{EphError, Result};
use crate::models::recip::RecipPtDb;
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{
    key_to_string, map_get, require, require_f64, require_mapping, require_str, to_array,
};

use ndarray::{Array1, Array2, Ix1, Ix2};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// `basic data` 块
#[derive(Debug, Clone)]
pub struct CalcHeader {
    pub alat: f64,
    /// 规范长度单位名
    pub alat_units: &'static str,
    /// 实空间基矢（列）
    pub lattice: Array2<f64>,
    /// 倒空间基矢（列）
    pub recip_lattice: Array2<f64>,
    pub num_atoms: usize,
    /// 原子位置（列），文件中缺省时为 None
    pub atomic_positions: Option<Array2<f64>>,
}

impl CalcHeader {
    /// 从顶层映射读取 `basic data`
    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let context = format!("basic data of {}", origin);
        let block = require_mapping(root, "basic data", origin)?;

        let alat = require_f64(block, "alat", &context)?;
        let alat_units = UnitFamily::Length.canonicalize(require_str(block, "alat units", &context)?)?;

        let lattice = read_vectors(require(block, "lattice vectors", &context)?, "lattice vectors")?;
        let recip_lattice = read_vectors(
            require(block, "reciprocal lattice vectors", &context)?,
            "reciprocal lattice vectors",
        )?;

        let num_atoms = require(block, "number of atoms in unit cell", &context)?
            .as_u64()
            .ok_or_else(|| EphError::InvalidValue {
                key: "number of atoms in unit cell".to_string(),
                reason: "expected a non-negative integer".to_string(),
            })? as usize;

        let atomic_positions = match map_get(block, "atomic positions") {
            Some(v) => Some(read_rows(v, "atomic positions")?),
            None => None,
        };

        Ok(CalcHeader {
            alat,
            alat_units,
            lattice,
            recip_lattice,
            num_atoms,
            atomic_positions,
        })
    }

    /// alat 换算到指定长度单位
    pub fn alat_in(&self, unit: &str) -> Result<f64> {
        let target = UnitFamily::Length.canonicalize(unit)?;
        Ok(self.alat * UnitFamily::Length.factor(self.alat_units, target)?)
    }

    /// 读取记录块中的一组倒空间点
    ///
    /// 键名以 `prefix` 开头，例如 `prefix = "k-point"` 时读取
    /// `k-point coordinates` / `k-point coordinate units`，以及可选的
    /// `k-path coordinates` / `k-path coordinate units` 与 `high symmetry points`。
    pub fn read_points(&self, block: &Mapping, prefix: &str, context: &str) -> Result<RecipPtDb> {
        let coords_key = format!("{} coordinates", prefix);
        let units_key = format!("{} coordinate units", prefix);

        // 文件中总是行向量列表，先显式转成列，避免 3×3 时被误判
        let raw = require(block, &coords_key, context)?;
        let coords = match raw {
            Value::Sequence(seq) if seq.first().is_some_and(Value::is_sequence) => {
                read_rows(raw, &coords_key)?.into_dyn()
            }
            _ => to_array(raw, &coords_key)?,
        };
        let unit = require_str(block, &units_key, context)?;
        let mut db = RecipPtDb::from_points(
            coords.view(),
            unit,
            self.lattice.view(),
            self.recip_lattice.view(),
        )?;

        let path_prefix = prefix.replace("-point", "-path");
        let path_key = format!("{} coordinates", path_prefix);
        if let Some(v) = map_get(block, &path_key) {
            let path = to_array(v, &path_key)?
                .into_dimensionality::<Ix1>()
                .map_err(|e| EphError::InvalidValue {
                    key: path_key.clone(),
                    reason: e.to_string(),
                })?;
            let path_unit = map_get(block, &format!("{} coordinate units", path_prefix))
                .and_then(Value::as_str)
                .unwrap_or("arbitrary");
            db = db.with_path(path, path_unit)?;
        }

        // 高对称点标签总是 crystal 坐标
        if let Some(labels) = map_get(block, "high symmetry points") {
            let labels = labels.as_mapping().ok_or_else(|| EphError::InvalidValue {
                key: "high symmetry points".to_string(),
                reason: "expected a mapping of label to point".to_string(),
            })?;
            let mut out = BTreeMap::new();
            for (name, point) in labels {
                let name = key_to_string(name).ok_or_else(|| EphError::InvalidValue {
                    key: "high symmetry points".to_string(),
                    reason: "labels must be strings".to_string(),
                })?;
                let point = read_vector3(point, &name)?;
                out.insert(name, point);
            }
            db.add_labels(out);
        }

        Ok(db)
    }
}

/// 三个基矢，映射（按键排序）或三行列表，返回列排列的 3×3 矩阵
fn read_vectors(v: &Value, key: &str) -> Result<Array2<f64>> {
    let rows = match v {
        Value::Mapping(m) => {
            let mut entries: Vec<(String, &Value)> = m
                .iter()
                .map(|(k, item)| (k.as_str().unwrap_or_default().to_string(), item))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut flat = Vec::with_capacity(9);
            for (name, item) in entries {
                let row = to_array(item, &name)?;
                if row.ndim() != 1 || row.len() != 3 {
                    return Err(EphError::ShapeError {
                        shape: row.shape().to_vec(),
                    });
                }
                flat.extend(row.iter().copied());
            }
            Array2::from_shape_vec((flat.len() / 3, 3), flat).map_err(|e| {
                EphError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?
        }
        _ => to_matrix(v, key)?,
    };
    if rows.dim() != (3, 3) {
        return Err(EphError::ShapeError {
            shape: rows.shape().to_vec(),
        });
    }
    Ok(rows.t().to_owned())
}

/// N×3 行列表转为 3×N 列矩阵
fn read_rows(v: &Value, key: &str) -> Result<Array2<f64>> {
    let rows = to_matrix(v, key)?;
    if rows.ncols() != 3 {
        return Err(EphError::ShapeError {
            shape: rows.shape().to_vec(),
        });
    }
    Ok(rows.t().to_owned())
}

fn to_matrix(v: &Value, key: &str) -> Result<Array2<f64>> {
    let arr = to_array(v, key)?;
    let shape = arr.shape().to_vec();
    arr.into_dimensionality::<Ix2>()
        .map_err(|_| EphError::ShapeError { shape })
}

/// 读取单个三维点（如 ephmat 的固定 k 点）
pub fn read_vector3(v: &Value, key: &str) -> Result<[f64; 3]> {
    let arr: Array1<f64> = to_array(v, key)?
        .into_dimensionality::<Ix1>()
        .map_err(|e| EphError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    if arr.len() != 3 {
        return Err(EphError::ShapeError {
            shape: vec![arr.len()],
        });
    }
    Ok([arr[0], arr[1], arr[2]])
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// 硅 FCC 头部（alat 单位下的晶格，2π/alat 单位下的倒格子）
    pub const SILICON_HEADER: &str = r#"
basic data:
  alat: 10.2
  alat units: bohr
  lattice vectors:
    a1: [-0.5, 0.0, 0.5]
    a2: [0.0, 0.5, 0.5]
    a3: [-0.5, 0.5, 0.0]
  reciprocal lattice vectors:
    - [-1.0, -1.0, 1.0]
    - [1.0, 1.0, 1.0]
    - [-1.0, 1.0, -1.0]
  number of atoms in unit cell: 2
  atomic positions:
    - [0.0, 0.0, 0.0]
    - [0.25, 0.25, 0.25]
"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::SILICON_HEADER;
    use super::*;

    fn root(extra: &str) -> Mapping {
        let text = format!("{}{}", SILICON_HEADER, extra);
        let v: Value = serde_yaml::from_str(&text).unwrap();
        v.as_mapping().unwrap().clone()
    }

    #[test]
    fn test_header_fields() {
        let h = CalcHeader::from_root(&root(""), "si.yml").unwrap();
        assert_eq!(h.alat, 10.2);
        assert_eq!(h.alat_units, "bohr");
        assert_eq!(h.num_atoms, 2);
        // a1 is the first column
        assert_eq!(h.lattice[[0, 0]], -0.5);
        assert_eq!(h.lattice[[2, 0]], 0.5);
        assert_eq!(h.recip_lattice[[1, 1]], 1.0);
        assert_eq!(h.atomic_positions.as_ref().unwrap().dim(), (3, 2));

        // a_i . b_j = delta_ij
        let prod = h.lattice.t().dot(&h.recip_lattice);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((prod[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_alat_conversion() {
        let h = CalcHeader::from_root(&root(""), "si.yml").unwrap();
        let ang = h.alat_in("angstrom").unwrap();
        assert!((ang - 10.2 * 0.529177210903).abs() < 1e-9);
        assert!(h.alat_in("furlong").is_err());
    }

    #[test]
    fn test_missing_basic_data() {
        let v: Value = serde_yaml::from_str("bands: {}").unwrap();
        let err = CalcHeader::from_root(v.as_mapping().unwrap(), "x.yml").unwrap_err();
        assert!(matches!(err, EphError::MissingKey { .. }));
    }

    #[test]
    fn test_read_points_with_path() {
        let h = CalcHeader::from_root(&root(""), "si.yml").unwrap();
        let block: Value = serde_yaml::from_str(
            r#"
k-point coordinate units: crystal
k-point coordinates:
  - [0.0, 0.0, 0.0]
  - [0.5, 0.0, 0.5]
k-path coordinate units: arbitrary
k-path coordinates: [0.0, 1.0]
high symmetry points:
  G: [0.0, 0.0, 0.0]
  X: [0.5, 0.0, 0.5]
  L: [0.5, 0.5, 0.5]
"#,
        )
        .unwrap();
        let db = h
            .read_points(block.as_mapping().unwrap(), "k-point", "bands")
            .unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.path()[1], 1.0);
        // X = 0.5 b1 + 0.5 b3 = (-1, 0, 0)
        let cart = db.cartesian();
        assert!((cart[[0, 1]] + 1.0).abs() < 1e-12);
        assert!(cart[[1, 1]].abs() < 1e-12);

        assert_eq!(db.labels().len(), 3);
        let ticks = db.labels_on_path(1e-8);
        assert_eq!(
            ticks,
            vec![("G".to_string(), 0.0), ("X".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_read_vector3() {
        let v: Value = serde_yaml::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(read_vector3(&v, "k").unwrap(), [0.1, 0.2, 0.3]);
        let v: Value = serde_yaml::from_str("[0.1, 0.2]").unwrap();
        assert!(read_vector3(&v, "k").is_err());
    }
}
