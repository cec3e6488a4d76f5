//! # 容差与忽略策略
//!
//! 测试框架为每对文件指定：
//! - `ignore keywords`: 在字典层面完全跳过的键
//! - `test keywords`: 顶层白名单，只比较这些键
//! - `tolerance`: 键 → `(atol, rtol)`，必须含 `default`
//!
//! YAML 格式示例：
//! ```yaml
//! ignore keywords: [timings, version]
//! test keywords: [bands, basic data]
//! tolerance:
//!   default: {atol: 1.0e-8, rtol: 1.0e-5}
//!   band index: {atol: 1.0e-4}
//!   alat: 1.0e-6          # 简写：atol = 1.0e-6, rtol = 0
//! ```
//!
//! ## 依赖关系
//! - 被 `compare/engine.rs`, `commands/` 使用
//! - 使用 `serde`, `serde_yaml`

use crate::error::{EphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// 一对绝对/相对容差
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Tolerance {
    pub fn new(atol: f64, rtol: f64) -> Self {
        Tolerance { atol, rtol }
    }

    /// `|a - b| <= atol + rtol * |a|`，以 `a` 为参考值
    ///
    /// 两侧同为 NaN 或完全相等（含同号无穷）时视为相等；
    /// 除此之外任一侧非有限值都不相等。
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b || (a.is_nan() && b.is_nan()) {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        (a - b).abs() <= self.atol + self.rtol * a.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            atol: 1e-8,
            rtol: 1e-5,
        }
    }
}

/// 容差策略
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TolerancePolicy {
    pub ignore_keywords: Option<BTreeSet<String>>,
    pub test_keywords: Option<BTreeSet<String>>,
    pub tolerance: BTreeMap<String, Tolerance>,
    pub default_tolerance: Tolerance,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTolerance {
    Shorthand(f64),
    Full {
        #[serde(default)]
        atol: f64,
        #[serde(default)]
        rtol: f64,
    },
}

impl From<RawTolerance> for Tolerance {
    fn from(raw: RawTolerance) -> Self {
        match raw {
            RawTolerance::Shorthand(atol) => Tolerance::new(atol, 0.0),
            RawTolerance::Full { atol, rtol } => Tolerance::new(atol, rtol),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolicy {
    #[serde(rename = "ignore keywords", default)]
    ignore_keywords: Option<Vec<String>>,
    #[serde(rename = "test keywords", default)]
    test_keywords: Option<Vec<String>>,
    #[serde(default)]
    tolerance: Option<BTreeMap<String, RawTolerance>>,
}

impl TolerancePolicy {
    /// 从 YAML 字符串解析；`origin` 用于错误信息
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self> {
        let raw: RawPolicy = serde_yaml::from_str(content).map_err(|e| EphError::ParseError {
            format: "tolerance policy".to_string(),
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

        let mut policy = TolerancePolicy {
            ignore_keywords: raw.ignore_keywords.map(|v| v.into_iter().collect()),
            test_keywords: raw.test_keywords.map(|v| v.into_iter().collect()),
            ..TolerancePolicy::default()
        };

        if let Some(mut table) = raw.tolerance {
            let default = table.remove("default").ok_or_else(|| EphError::MissingKey {
                key: "default".to_string(),
                context: format!("tolerance table of {}", origin),
            })?;
            policy.default_tolerance = default.into();
            policy.tolerance = table.into_iter().map(|(k, v)| (k, v.into())).collect();
        }

        for (key, tol) in std::iter::once(("default", &policy.default_tolerance))
            .chain(policy.tolerance.iter().map(|(k, v)| (k.as_str(), v)))
        {
            if !(tol.atol >= 0.0 && tol.rtol >= 0.0) {
                return Err(EphError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("tolerances must be non-negative, got {:?}", tol),
                });
            }
        }

        Ok(policy)
    }

    /// 从 YAML 文件读取
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EphError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| EphError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    pub fn with_default(mut self, tol: Tolerance) -> Self {
        self.default_tolerance = tol;
        self
    }

    pub fn with_tolerance(mut self, key: impl Into<String>, tol: Tolerance) -> Self {
        self.tolerance.insert(key.into(), tol);
        self
    }

    pub fn with_ignore<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_keywords
            .get_or_insert_with(BTreeSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_test_keywords<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_keywords
            .get_or_insert_with(BTreeSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    /// 查找键对应的容差；未列出（或无键）时使用默认值
    pub fn tolerance_for(&self, key: Option<&str>) -> Tolerance {
        key.and_then(|k| self.tolerance.get(k))
            .copied()
            .unwrap_or(self.default_tolerance)
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore_keywords
            .as_ref()
            .is_some_and(|set| set.contains(key))
    }
}
