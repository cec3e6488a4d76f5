//! # `trans` 模式记录
//!
//! 输运计算按构型输出温度、化学势、载流子浓度与 3×3 电导率张量：
//!
//! ```yaml
//! trans:
//!   temperature units: K
//!   chemical potential units: eV
//!   concentration units: cm-3
//!   conductivity units: 1/Ohm/m
//!   configuration index:
//!     1:
//!       temperature: 300.0
//!       chemical potential: 6.5
//!       concentration: 1.0e18
//!       conductivity:
//!         - [xx, xy, xz]
//!         - [yx, yy, yz]
//!         - [zx, zy, zz]
//! ```
//!
//! 化学势走单位注册表；浓度与电导率单位只记录原文。
//!
//! ## 依赖关系
//! - 被 `calc/mod.rs` 的 `load_record` 使用
//! - 使用 `models/quantity.rs`, `parsers/yaml.rs`

use super::{open_record, CalcHeader, CalcMode};
use crate::error::{EphError, Result};
use crate::models::quantity::{QuantityKey, QuantityMap, QuantityValue};
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{map_get, require, require_mapping, require_str, to_array};

use ndarray::{Array2, Ix2};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// 输运计算结果
#[derive(Debug, Clone)]
pub struct Trans {
    pub header: CalcHeader,
    /// 构型编号 → 温度
    pub temperatures: BTreeMap<QuantityKey, f64>,
    pub temperature_units: String,
    /// 构型编号 → 化学势
    pub chemical_potentials: QuantityMap,
    /// 构型编号 → 载流子浓度
    pub concentrations: BTreeMap<QuantityKey, f64>,
    pub concentration_units: String,
    /// 构型编号 → 电导率张量
    pub conductivity: BTreeMap<QuantityKey, Array2<f64>>,
    pub conductivity_units: String,
}

impl Trans {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Trans)?;
        Trans::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "trans", origin)?;
        let configs = require_mapping(block, "configuration index", origin)?;

        let mut temperatures = BTreeMap::new();
        let mut mu = BTreeMap::new();
        let mut concentrations = BTreeMap::new();
        let mut conductivity = BTreeMap::new();
        for (k, value) in configs {
            let cfg = QuantityKey::from_yaml(k)?;
            let context = format!("configuration {} of {}", cfg, origin);
            let inner = match value {
                Value::Mapping(m) => m,
                _ => return Err(invalid(&cfg.to_string(), "expected a mapping")),
            };
            let scalar = |name: &str| -> Result<f64> {
                match QuantityValue::from_yaml(require(inner, name, &context)?, name)? {
                    QuantityValue::Scalar(x) => Ok(x),
                    _ => Err(invalid(name, "expected a number")),
                }
            };
            temperatures.insert(cfg.clone(), scalar("temperature")?);
            mu.insert(cfg.clone(), QuantityValue::Scalar(scalar("chemical potential")?));
            concentrations.insert(cfg.clone(), scalar("concentration")?);
            conductivity.insert(cfg, read_tensor(inner, "conductivity", &context)?);
        }

        let chemical_potentials = QuantityMap::new(
            mu,
            UnitFamily::Energy,
            require_str(block, "chemical potential units", origin)?,
        )?;
        let unit = |name: &str| -> String {
            map_get(block, name)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };

        Ok(Trans {
            header,
            temperatures,
            temperature_units: require_str(block, "temperature units", origin)?.to_string(),
            chemical_potentials,
            concentrations,
            concentration_units: unit("concentration units"),
            conductivity,
            conductivity_units: unit("conductivity units"),
        })
    }

    pub fn num_configurations(&self) -> usize {
        self.temperatures.len()
    }

    /// 各构型电导率张量的迹的三分之一
    pub fn average_conductivity(&self) -> BTreeMap<QuantityKey, f64> {
        self.conductivity
            .iter()
            .map(|(cfg, t)| (cfg.clone(), t.diag().sum() / 3.0))
            .collect()
    }
}

fn read_tensor(m: &Mapping, key: &str, context: &str) -> Result<Array2<f64>> {
    let arr = to_array(require(m, key, context)?, key)?;
    if arr.shape() != [3, 3] {
        return Err(EphError::ShapeError {
            shape: arr.shape().to_vec(),
        });
    }
    arr.into_dimensionality::<Ix2>()
        .map_err(|e| invalid(key, &e.to_string()))
}

fn invalid(key: &str, reason: &str) -> EphError {
    EphError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::header::fixtures::SILICON_HEADER;
    use std::fs;

    const BODY: &str = r#"
input parameters:
  calc_mode: trans
trans:
  temperature units: K
  chemical potential units: eV
  concentration units: cm-3
  conductivity units: 1/Ohm/m
  configuration index:
    1:
      temperature: 300.0
      chemical potential: 6.5
      concentration: 1.0e18
      conductivity:
        - [3.0e4, 0.0, 0.0]
        - [0.0, 3.0e4, 0.0]
        - [0.0, 0.0, 3.0e4]
    2:
      temperature: 100.0
      chemical potential: 6.4
      concentration: 1.0e17
      conductivity:
        - [9.0e3, 1.0, 0.0]
        - [1.0, 6.0e3, 0.0]
        - [0.0, 0.0, 3.0e3]
"#;

    fn trans() -> Trans {
        let v: Value = serde_yaml::from_str(&format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        Trans::from_root(v.as_mapping().unwrap(), "si_trans.yml").unwrap()
    }

    #[test]
    fn test_trans_structure() {
        let t = trans();
        assert_eq!(t.num_configurations(), 2);
        assert_eq!(t.temperatures[&QuantityKey::Index(2)], 100.0);
        assert_eq!(t.concentrations[&QuantityKey::Index(1)], 1.0e18);
        assert_eq!(t.concentration_units, "cm-3");
        assert_eq!(t.conductivity[&QuantityKey::Index(2)][[0, 1]], 1.0);

        let avg = t.average_conductivity();
        assert!((avg[&QuantityKey::Index(2)] - 6.0e3).abs() < 1e-9);

        let mu = t.chemical_potentials.to_units("meV").unwrap();
        let mu1 = mu.get(&QuantityKey::Index(1)).unwrap().as_scalar().unwrap();
        assert!((mu1 - 6500.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_square_conductivity() {
        let body = BODY.replace("        - [0.0, 0.0, 3.0e4]\n", "");
        let v: Value = serde_yaml::from_str(&format!("{}{}", SILICON_HEADER, body)).unwrap();
        let err = Trans::from_root(v.as_mapping().unwrap(), "x.yml").unwrap_err();
        assert!(matches!(err, EphError::ShapeError { .. }));
    }

    #[test]
    fn test_from_yaml_checks_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("si_trans.yml");
        fs::write(&path, format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        assert_eq!(Trans::from_yaml(&path).unwrap().num_configurations(), 2);

        let wrong = dir.path().join("si_imsigma.yml");
        fs::write(
            &wrong,
            format!("{}{}", SILICON_HEADER, BODY.replace("calc_mode: trans", "calc_mode: imsigma")),
        )
        .unwrap();
        match Trans::from_yaml(&wrong).unwrap_err() {
            EphError::InvalidCalcMode { expected, found } => {
                assert_eq!(expected, "trans");
                assert_eq!(found, "imsigma");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
