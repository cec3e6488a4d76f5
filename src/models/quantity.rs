//! # 带单位的物理量容器
//!
//! `QuantityMap` 将索引（能带编号、声子模式、构型编号……）映射到
//! 标量、数组或下一层映射，整个嵌套结构共用一个单位。
//!
//! 单位换算通过 [`QuantityValue::scale`] 对任意深度的嵌套递归执行，
//! 不假设只有一层索引。
//!
//! ## 依赖关系
//! - 被 `calc/` 使用
//! - 使用 `models/units.rs`, `parsers/yaml.rs`

use crate::error::{EphError, Result};
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{as_f64, kind_name, to_array};

use ndarray::ArrayD;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::ops::Index;

/// 容器索引
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuantityKey {
    /// 整数索引（能带、模式、构型编号）
    Index(i64),
    /// 字符串索引
    Name(String),
}

impl From<i64> for QuantityKey {
    fn from(i: i64) -> Self {
        QuantityKey::Index(i)
    }
}

impl From<usize> for QuantityKey {
    fn from(i: usize) -> Self {
        QuantityKey::Index(i as i64)
    }
}

impl From<&str> for QuantityKey {
    fn from(s: &str) -> Self {
        QuantityKey::Name(s.to_string())
    }
}

impl std::fmt::Display for QuantityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityKey::Index(i) => write!(f, "{}", i),
            QuantityKey::Name(s) => write!(f, "{}", s),
        }
    }
}

impl QuantityKey {
    pub(crate) fn from_yaml(k: &Value) -> Result<Self> {
        match k {
            Value::Number(n) => n.as_i64().map(QuantityKey::Index).ok_or_else(|| {
                EphError::InvalidValue {
                    key: n.to_string(),
                    reason: "non-integer numeric key".to_string(),
                }
            }),
            Value::String(s) => Ok(s
                .parse::<i64>()
                .map(QuantityKey::Index)
                .unwrap_or_else(|_| QuantityKey::Name(s.clone()))),
            other => Err(EphError::InvalidValue {
                key: kind_name(other).to_string(),
                reason: "unsupported mapping key".to_string(),
            }),
        }
    }
}

/// 容器中的值：标量、数组或嵌套映射
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityValue {
    Scalar(f64),
    Array(ArrayD<f64>),
    Map(BTreeMap<QuantityKey, QuantityValue>),
}

impl QuantityValue {
    /// 从 YAML 值构造：列表 → 数组，数值 → 标量，映射 → 递归
    pub fn from_yaml(v: &Value, context: &str) -> Result<Self> {
        match v {
            Value::Mapping(m) => {
                let mut out = BTreeMap::new();
                for (k, item) in m {
                    let key = QuantityKey::from_yaml(k)?;
                    let child_context = format!("{}.{}", context, key);
                    out.insert(key, QuantityValue::from_yaml(item, &child_context)?);
                }
                Ok(QuantityValue::Map(out))
            }
            Value::Sequence(_) => Ok(QuantityValue::Array(to_array(v, context)?)),
            _ => as_f64(v)
                .map(QuantityValue::Scalar)
                .ok_or_else(|| EphError::InvalidValue {
                    key: context.to_string(),
                    reason: format!("expected number, list or mapping, got {}", kind_name(v)),
                }),
        }
    }

    /// 递归地将所有叶子数值乘以 `factor`
    pub fn scale(&mut self, factor: f64) {
        match self {
            QuantityValue::Scalar(x) => *x *= factor,
            QuantityValue::Array(a) => a.mapv_inplace(|x| x * factor),
            QuantityValue::Map(m) => {
                for child in m.values_mut() {
                    child.scale(factor);
                }
            }
        }
    }

    /// 叶子数值总数
    pub fn leaf_count(&self) -> usize {
        match self {
            QuantityValue::Scalar(_) => 1,
            QuantityValue::Array(a) => a.len(),
            QuantityValue::Map(m) => m.values().map(|c| c.leaf_count()).sum(),
        }
    }

    /// 所有叶子的最大绝对值（空容器为 None）
    pub fn max_abs(&self) -> Option<f64> {
        match self {
            QuantityValue::Scalar(x) => Some(x.abs()),
            QuantityValue::Array(a) => a.iter().map(|x| x.abs()).reduce(f64::max),
            QuantityValue::Map(m) => m.values().filter_map(|c| c.max_abs()).reduce(f64::max),
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            QuantityValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            QuantityValue::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<QuantityKey, QuantityValue>> {
        match self {
            QuantityValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// 带单位的物理量映射
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityMap {
    family: UnitFamily,
    unit: &'static str,
    values: BTreeMap<QuantityKey, QuantityValue>,
}

impl QuantityMap {
    /// 包装已有映射，单位名先规范化
    pub fn new(
        values: BTreeMap<QuantityKey, QuantityValue>,
        family: UnitFamily,
        unit: &str,
    ) -> Result<Self> {
        let unit = family.canonicalize(unit)?;
        Ok(QuantityMap {
            family,
            unit,
            values,
        })
    }

    /// 从 YAML 映射构造
    pub fn from_yaml(v: &Value, family: UnitFamily, unit: &str) -> Result<Self> {
        match QuantityValue::from_yaml(v, "quantity")? {
            QuantityValue::Map(values) => QuantityMap::new(values, family, unit),
            _ => Err(EphError::InvalidValue {
                key: "quantity".to_string(),
                reason: format!("expected a mapping, got {}", kind_name(v)),
            }),
        }
    }

    pub fn family(&self) -> UnitFamily {
        self.family
    }

    /// 当前规范单位名
    pub fn unit(&self) -> &'static str {
        self.unit
    }

    /// 原地换算到目标单位
    pub fn convert_units(&mut self, target: &str) -> Result<()> {
        let target = self.family.canonicalize(target)?;
        let factor = self.family.factor(self.unit, target)?;
        if factor != 1.0 {
            for value in self.values.values_mut() {
                value.scale(factor);
            }
        }
        self.unit = target;
        Ok(())
    }

    /// 返回换算后的副本，原容器不变
    pub fn to_units(&self, target: &str) -> Result<Self> {
        let mut copy = self.clone();
        copy.convert_units(target)?;
        Ok(copy)
    }

    /// 按索引取值；不存在时报 `KeyNotFound`
    pub fn get(&self, key: &QuantityKey) -> Result<&QuantityValue> {
        self.values
            .get(key)
            .ok_or_else(|| EphError::KeyNotFound(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &QuantityKey> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuantityKey, &QuantityValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 所有叶子数值总数
    pub fn leaf_count(&self) -> usize {
        self.values.values().map(|v| v.leaf_count()).sum()
    }

    /// 所有叶子的最大绝对值
    pub fn max_abs(&self) -> Option<f64> {
        self.values
            .values()
            .filter_map(|v| v.max_abs())
            .reduce(f64::max)
    }
}

impl Index<&QuantityKey> for QuantityMap {
    type Output = QuantityValue;

    fn index(&self, key: &QuantityKey) -> &QuantityValue {
        &self.values[key]
    }
}
