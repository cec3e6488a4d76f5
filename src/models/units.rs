//! # 单位注册表
//!
//! 每个物理量族（能量、长度、时间）维护一张静态表：
//! 规范单位名 → 别名列表 + 换算常数。
//!
//! 换算常数的含义是「1 个参考单位在该单位下的数值」，
//! 参考单位分别为 1 eV、1 bohr、1 fs。因此
//! `value_in_to = value_in_from * factor(from, to)`，
//! 其中 `factor(from, to) = table[to] / table[from]`。
//!
//! 倒空间点的坐标基（crystal / cartesian）没有换算常数，
//! 单独规范化为封闭枚举 [`RecipBasis`]。
//!
//! ## 依赖关系
//! - 被 `models/quantity.rs`, `models/recip.rs`, `calc/` 使用
//! - 无外部模块依赖

use crate::error::{EphError, Result};
use serde::{Deserialize, Serialize};

/// 单位表条目
#[derive(Debug, Clone, Copy)]
pub struct UnitEntry {
    /// 规范单位名
    pub name: &'static str,
    /// 别名（小写，包含规范名本身）
    pub aliases: &'static [&'static str],
    /// 1 个参考单位在该单位下的数值
    pub value: f64,
}

const HA_IN_EV: f64 = 27.211386245988;
const RY_IN_EV: f64 = HA_IN_EV / 2.0;

const ENERGY_UNITS: &[UnitEntry] = &[
    UnitEntry {
        name: "eV",
        aliases: &["ev", "electronvolt", "electronvolts"],
        value: 1.0,
    },
    UnitEntry {
        name: "meV",
        aliases: &["mev", "millielectronvolt", "millielectronvolts"],
        value: 1.0e3,
    },
    UnitEntry {
        name: "Ry",
        aliases: &["ry", "rydberg", "rydbergs"],
        value: 1.0 / RY_IN_EV,
    },
    UnitEntry {
        name: "mRy",
        aliases: &["mry", "millirydberg"],
        value: 1.0e3 / RY_IN_EV,
    },
    UnitEntry {
        name: "Ha",
        aliases: &["ha", "hartree", "hartrees"],
        value: 1.0 / HA_IN_EV,
    },
    UnitEntry {
        name: "mHa",
        aliases: &["mha", "millihartree"],
        value: 1.0e3 / HA_IN_EV,
    },
    UnitEntry {
        name: "J",
        aliases: &["j", "joule", "joules"],
        value: 1.602176634e-19,
    },
    UnitEntry {
        name: "THz",
        aliases: &["thz", "terahertz"],
        value: 241.798924208,
    },
    UnitEntry {
        name: "cm-1",
        aliases: &["cm-1", "cm^-1", "1/cm", "wavenumber", "wavenumbers"],
        value: 8065.543937,
    },
];

const LENGTH_UNITS: &[UnitEntry] = &[
    UnitEntry {
        name: "bohr",
        aliases: &["bohr", "a.u.", "au", "a0"],
        value: 1.0,
    },
    UnitEntry {
        name: "angstrom",
        aliases: &["angstrom", "angstroms", "ang", "a", "å"],
        value: 0.529177210903,
    },
    UnitEntry {
        name: "nm",
        aliases: &["nm", "nanometer", "nanometers"],
        value: 0.0529177210903,
    },
    UnitEntry {
        name: "cm",
        aliases: &["cm", "centimeter", "centimeters"],
        value: 0.529177210903e-8,
    },
    UnitEntry {
        name: "m",
        aliases: &["m", "meter", "meters"],
        value: 0.529177210903e-10,
    },
];

const TIME_UNITS: &[UnitEntry] = &[
    UnitEntry {
        name: "fs",
        aliases: &["fs", "femtosecond", "femtoseconds"],
        value: 1.0,
    },
    UnitEntry {
        name: "as",
        aliases: &["as", "attosecond", "attoseconds"],
        value: 1.0e3,
    },
    UnitEntry {
        name: "ps",
        aliases: &["ps", "picosecond", "picoseconds"],
        value: 1.0e-3,
    },
    UnitEntry {
        name: "ns",
        aliases: &["ns", "nanosecond", "nanoseconds"],
        value: 1.0e-6,
    },
    UnitEntry {
        name: "s",
        aliases: &["s", "sec", "second", "seconds"],
        value: 1.0e-15,
    },
    UnitEntry {
        name: "au",
        aliases: &["au", "a.u.", "atomic time"],
        value: 41.341374575751,
    },
];

/// 物理量族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitFamily {
    Energy,
    Length,
    Time,
}

impl std::fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitFamily::Energy => write!(f, "energy"),
            UnitFamily::Length => write!(f, "length"),
            UnitFamily::Time => write!(f, "time"),
        }
    }
}

impl UnitFamily {
    /// 该族的静态单位表
    pub fn table(&self) -> &'static [UnitEntry] {
        match self {
            UnitFamily::Energy => ENERGY_UNITS,
            UnitFamily::Length => LENGTH_UNITS,
            UnitFamily::Time => TIME_UNITS,
        }
    }

    /// 所有规范单位名
    pub fn units(&self) -> Vec<&'static str> {
        self.table().iter().map(|e| e.name).collect()
    }

    fn entry(&self, name: &str) -> Result<&'static UnitEntry> {
        let lowered = name.trim().to_lowercase();
        self.table()
            .iter()
            .find(|e| e.aliases.contains(&lowered.as_str()))
            .ok_or_else(|| EphError::UnknownUnit {
                family: self.to_string(),
                name: name.to_string(),
            })
    }

    /// 别名（大小写不敏感）→ 规范单位名
    pub fn canonicalize(&self, name: &str) -> Result<&'static str> {
        self.entry(name).map(|e| e.name)
    }

    /// 换算因子：`value_in_to = value_in_from * factor`
    pub fn factor(&self, from: &str, to: &str) -> Result<f64> {
        let from = self.entry(from)?;
        let to = self.entry(to)?;
        if from.name == to.name {
            return Ok(1.0);
        }
        Ok(to.value / from.value)
    }
}

/// 倒空间点的坐标基
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipBasis {
    /// 以倒格矢为基的分数坐标
    Crystal,
    /// 笛卡尔坐标（2π/alat 单位）
    Cartesian,
}

const CRYSTAL_ALIASES: &[&str] = &["crystal", "frac", "fractional", "reduced"];
const CARTESIAN_ALIASES: &[&str] = &["cartesian", "cart", "tpiba"];

impl RecipBasis {
    /// 别名（大小写不敏感）→ 坐标基
    pub fn canonicalize(name: &str) -> Result<Self> {
        let lowered = name.trim().to_lowercase();
        if CRYSTAL_ALIASES.contains(&lowered.as_str()) {
            Ok(RecipBasis::Crystal)
        } else if CARTESIAN_ALIASES.contains(&lowered.as_str()) {
            Ok(RecipBasis::Cartesian)
        } else {
            Err(EphError::UnknownUnit {
                family: "reciprocal point".to_string(),
                name: name.to_string(),
            })
        }
    }

    /// 规范名
    pub fn name(&self) -> &'static str {
        match self {
            RecipBasis::Crystal => "crystal",
            RecipBasis::Cartesian => "cartesian",
        }
    }
}

impl std::fmt::Display for RecipBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for RecipBasis {
    type Err = EphError;

    fn from_str(s: &str) -> Result<Self> {
        RecipBasis::canonicalize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILIES: [UnitFamily; 3] = [UnitFamily::Energy, UnitFamily::Length, UnitFamily::Time];

    #[test]
    fn test_canonical_name_is_own_alias() {
        for family in FAMILIES {
            for entry in family.table() {
                assert_eq!(family.canonicalize(entry.name).unwrap(), entry.name);
            }
        }
    }

    #[test]
    fn test_aliases_disjoint_within_family() {
        for family in FAMILIES {
            let table = family.table();
            for (i, a) in table.iter().enumerate() {
                for b in &table[i + 1..] {
                    for alias in a.aliases {
                        assert!(
                            !b.aliases.contains(alias),
                            "{} alias '{}' maps to both {} and {}",
                            family,
                            alias,
                            a.name,
                            b.name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_aliases_are_lowercase() {
        for family in FAMILIES {
            for entry in family.table() {
                for alias in entry.aliases {
                    assert_eq!(*alias, alias.to_lowercase());
                }
            }
        }
    }

    #[test]
    fn test_canonicalize_case_insensitive() {
        assert_eq!(UnitFamily::Energy.canonicalize("HARTREE").unwrap(), "Ha");
        assert_eq!(UnitFamily::Energy.canonicalize("mev").unwrap(), "meV");
        assert_eq!(UnitFamily::Length.canonicalize("Angstrom").unwrap(), "angstrom");
        assert_eq!(UnitFamily::Time.canonicalize(" PS ").unwrap(), "ps");
    }

    #[test]
    fn test_unknown_unit() {
        let err = UnitFamily::Energy.canonicalize("furlong").unwrap_err();
        assert!(matches!(err, EphError::UnknownUnit { .. }));
        assert!(UnitFamily::Energy.factor("eV", "bohr").is_err());
    }

    #[test]
    fn test_factor_identity_is_exact() {
        for family in FAMILIES {
            for unit in family.units() {
                assert_eq!(family.factor(unit, unit).unwrap(), 1.0);
            }
        }
        assert_eq!(UnitFamily::Energy.factor("ev", "eV").unwrap(), 1.0);
    }

    #[test]
    fn test_factor_round_trip() {
        for family in FAMILIES {
            for a in family.units() {
                for b in family.units() {
                    let product = family.factor(a, b).unwrap() * family.factor(b, a).unwrap();
                    assert!((product - 1.0).abs() < 1e-12, "{} <-> {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_energy_factors() {
        let f = UnitFamily::Energy.factor("eV", "Ha").unwrap();
        assert!((f - 1.0 / 27.2114).abs() < 1e-6);

        let f = UnitFamily::Energy.factor("Ha", "eV").unwrap();
        assert!((f - 27.2114).abs() < 1e-3);

        let f = UnitFamily::Energy.factor("Ry", "Ha").unwrap();
        assert!((f - 0.5).abs() < 1e-12);

        let f = UnitFamily::Energy.factor("eV", "meV").unwrap();
        assert!((f - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_factors() {
        let f = UnitFamily::Length.factor("bohr", "angstrom").unwrap();
        assert!((f - 0.529177).abs() < 1e-6);

        let f = UnitFamily::Length.factor("nm", "angstrom").unwrap();
        assert!((f - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_recip_basis() {
        assert_eq!(RecipBasis::canonicalize("Crystal").unwrap(), RecipBasis::Crystal);
        assert_eq!(RecipBasis::canonicalize("frac").unwrap(), RecipBasis::Crystal);
        assert_eq!(RecipBasis::canonicalize("CART").unwrap(), RecipBasis::Cartesian);
        assert_eq!(
            "tpiba".parse::<RecipBasis>().unwrap(),
            RecipBasis::Cartesian
        );
        assert!(RecipBasis::canonicalize("bohr").is_err());
    }
}
