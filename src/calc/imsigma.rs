//! # `imsigma` 模式记录
//!
//! 自能虚部按“构型 → 能带 → 各 k 点数值”两层嵌套输出，
//! 每个构型带有温度与化学势：
//!
//! ```yaml
//! imsigma:
//!   k-point coordinate units: crystal
//!   k-point coordinates: [[...], ...]
//!   energy units: eV
//!   band index:              # 各能带在各 k 点的能量
//!     1: [...]
//!   temperature units: K
//!   chemical potential units: eV
//!   imsigma units: meV
//!   configuration index:
//!     1:
//!       temperature: 300.0
//!       chemical potential: 6.4
//!       band index:
//!         1: [...]
//! ```

use super::bands::read_dispersion;
use super::{open_record, CalcHeader, CalcMode};
use crate::error::{EphError, Result};
use crate::models::quantity::{QuantityKey, QuantityMap, QuantityValue};
use crate::models::recip::RecipPtDb;
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{require, require_mapping, require_str};

use serde_yaml::Mapping;
use std::collections::BTreeMap;
use std::path::Path;

/// 电子自能虚部
#[derive(Debug, Clone)]
pub struct Imsigma {
    pub header: CalcHeader,
    pub kpt: RecipPtDb,
    /// 能带编号 → 各 k 点能量
    pub energies: QuantityMap,
    /// 构型编号 → 温度
    pub temperatures: BTreeMap<QuantityKey, f64>,
    pub temperature_units: String,
    /// 构型编号 → 化学势
    pub chemical_potentials: QuantityMap,
    /// 构型编号 → 能带编号 → 各 k 点 Im Σ
    pub imsigma: QuantityMap,
}

impl Imsigma {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Imsigma)?;
        Imsigma::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "imsigma", origin)?;
        let (kpt, energies) =
            read_dispersion(&header, block, "k-point", "energy units", "band index", origin)?;

        let configs = match QuantityValue::from_yaml(
            require(block, "configuration index", origin)?,
            "configuration index",
        )? {
            QuantityValue::Map(m) => m,
            _ => return Err(invalid("configuration index", "expected a mapping")),
        };

        let mut temperatures = BTreeMap::new();
        let mut mu = BTreeMap::new();
        let mut sigma = BTreeMap::new();
        for (cfg, value) in configs {
            let inner = value
                .as_map()
                .ok_or_else(|| invalid(&cfg.to_string(), "expected a mapping"))?;
            let scalar = |name: &str| -> Result<f64> {
                inner
                    .get(&QuantityKey::from(name))
                    .and_then(QuantityValue::as_scalar)
                    .ok_or_else(|| EphError::MissingKey {
                        key: name.to_string(),
                        context: format!("configuration {} of {}", cfg, origin),
                    })
            };
            temperatures.insert(cfg.clone(), scalar("temperature")?);
            mu.insert(cfg.clone(), QuantityValue::Scalar(scalar("chemical potential")?));

            let bands = inner
                .get(&QuantityKey::from("band index"))
                .filter(|v| v.as_map().is_some())
                .ok_or_else(|| EphError::MissingKey {
                    key: "band index".to_string(),
                    context: format!("configuration {} of {}", cfg, origin),
                })?;
            sigma.insert(cfg, bands.clone());
        }

        let chemical_potentials = QuantityMap::new(
            mu,
            UnitFamily::Energy,
            require_str(block, "chemical potential units", origin)?,
        )?;
        let imsigma = QuantityMap::new(
            sigma,
            UnitFamily::Energy,
            require_str(block, "imsigma units", origin)?,
        )?;
        let temperature_units = require_str(block, "temperature units", origin)?.to_string();

        Ok(Imsigma {
            header,
            kpt,
            energies,
            temperatures,
            temperature_units,
            chemical_potentials,
            imsigma,
        })
    }

    pub fn num_configurations(&self) -> usize {
        self.temperatures.len()
    }

    pub fn num_bands(&self) -> usize {
        self.energies.len()
    }
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
    use serde_yaml::Value;

    const BODY: &str = r#"
input parameters:
  calc_mode: imsigma
imsigma:
  k-point coordinate units: crystal
  k-point coordinates:
    - [0.0, 0.0, 0.0]
    - [0.25, 0.0, 0.25]
  energy units: eV
  band index:
    1: [6.2, 6.6]
    2: [6.2, 7.0]
  temperature units: K
  chemical potential units: eV
  imsigma units: meV
  configuration index:
    1:
      temperature: 300.0
      chemical potential: 6.4
      band index:
        1: [1.5, 2.0]
        2: [1.6, 3.0]
    2:
      temperature: 77.0
      chemical potential: 6.3
      band index:
        1: [0.5, 0.7]
        2: [0.6, 1.0]
"#;

    fn imsigma() -> Imsigma {
        let v: Value = serde_yaml::from_str(&format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        Imsigma::from_root(v.as_mapping().unwrap(), "si_imsigma.yml").unwrap()
    }

    #[test]
    fn test_imsigma_structure() {
        let s = imsigma();
        assert_eq!(s.num_configurations(), 2);
        assert_eq!(s.num_bands(), 2);
        assert_eq!(s.temperatures[&QuantityKey::Index(2)], 77.0);
        assert_eq!(s.imsigma.leaf_count(), 8);
        assert_eq!(s.temperature_units, "K");
    }

    #[test]
    fn test_two_level_conversion() {
        let mut s = imsigma();
        s.imsigma.convert_units("eV").unwrap();
        let cfg1 = s.imsigma[&QuantityKey::Index(1)].as_map().unwrap();
        let band2 = cfg1[&QuantityKey::Index(2)].as_array().unwrap();
        assert!((band2[1] - 3.0e-3).abs() < 1e-12);

        let mu = s.chemical_potentials.to_units("meV").unwrap();
        let mu2 = mu[&QuantityKey::Index(2)].as_scalar().unwrap();
        assert!((mu2 - 6300.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_temperature() {
        let text = format!("{}{}", SILICON_HEADER, BODY).replace("      temperature: 77.0\n", "");
        let v: Value = serde_yaml::from_str(&text).unwrap();
        let err = Imsigma::from_root(v.as_mapping().unwrap(), "bad.yml").unwrap_err();
        assert!(matches!(err, EphError::MissingKey { .. }));
    }
}
