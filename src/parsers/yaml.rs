//! # YAML 辅助函数
//!
//! 模拟程序输出的 YAML 是 `顶层键 → 嵌套映射` 结构。
//! 这里提供按字符串键查找、必需键检查、数值/数组提取等工具。
//!
//! ## 依赖关系
//! - 被 `models/quantity.rs`, `calc/`, `compare/tree.rs` 使用
//! - 使用 `serde_yaml`, `ndarray`

use crate::error::{EphError, Result};
use ndarray::{ArrayD, IxDyn};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// 读取并解析 YAML 文件
pub fn read_yaml_file(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(EphError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| EphError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    serde_yaml::from_str(&content).map_err(|e| EphError::ParseError {
        format: "yaml".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// 按字符串键查找映射中的值
pub fn map_get<'a>(m: &'a Mapping, key: &str) -> Option<&'a Value> {
    m.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

/// 查找必需的键
pub fn require<'a>(m: &'a Mapping, key: &str, context: &str) -> Result<&'a Value> {
    map_get(m, key).ok_or_else(|| EphError::MissingKey {
        key: key.to_string(),
        context: context.to_string(),
    })
}

/// 查找必需的子映射
pub fn require_mapping<'a>(m: &'a Mapping, key: &str, context: &str) -> Result<&'a Mapping> {
    require(m, key, context)?
        .as_mapping()
        .ok_or_else(|| EphError::InvalidValue {
            key: key.to_string(),
            reason: "expected a mapping".to_string(),
        })
}

/// 查找必需的字符串
pub fn require_str<'a>(m: &'a Mapping, key: &str, context: &str) -> Result<&'a str> {
    require(m, key, context)?
        .as_str()
        .ok_or_else(|| EphError::InvalidValue {
            key: key.to_string(),
            reason: "expected a string".to_string(),
        })
}

/// 查找必需的数值
pub fn require_f64(m: &Mapping, key: &str, context: &str) -> Result<f64> {
    let v = require(m, key, context)?;
    as_f64(v).ok_or_else(|| EphError::InvalidValue {
        key: key.to_string(),
        reason: format!("expected a number, got {}", kind_name(v)),
    })
}

/// 数值转换（整数与浮点数都接受）
pub fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// 将映射的键转换为字符串（模拟程序常用整数键）
pub fn key_to_string(k: &Value) -> Option<String> {
    match k {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// YAML 值的类型名，用于错误信息
pub fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dict",
        Value::Tagged(_) => "tagged value",
    }
}

/// 将（可嵌套的）数值列表转换为规则的 N 维数组
///
/// 标量转换为 0 维数组；不规则嵌套报错。
pub fn to_array(v: &Value, key: &str) -> Result<ArrayD<f64>> {
    let mut shape = Vec::new();
    infer_shape(v, &mut shape);

    let mut flat = Vec::new();
    flatten_into(v, 0, &shape, &mut flat, key)?;

    ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| EphError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn infer_shape(v: &Value, shape: &mut Vec<usize>) {
    if let Value::Sequence(seq) = v {
        shape.push(seq.len());
        if let Some(first) = seq.first() {
            infer_shape(first, shape);
        }
    }
}

fn flatten_into(
    v: &Value,
    depth: usize,
    shape: &[usize],
    flat: &mut Vec<f64>,
    key: &str,
) -> Result<()> {
    match v {
        Value::Sequence(seq) => {
            if depth >= shape.len() || seq.len() != shape[depth] {
                return Err(EphError::InvalidValue {
                    key: key.to_string(),
                    reason: "ragged nested list cannot form an array".to_string(),
                });
            }
            for item in seq {
                flatten_into(item, depth + 1, shape, flat, key)?;
            }
            Ok(())
        }
        _ if depth == shape.len() => {
            let x = as_f64(v).ok_or_else(|| EphError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a number, got {}", kind_name(v)),
            })?;
            flat.push(x);
            Ok(())
        }
        _ => Err(EphError::InvalidValue {
            key: key.to_string(),
            reason: "ragged nested list cannot form an array".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_array_matrix() {
        let v: Value = serde_yaml::from_str("[[1, 2, 3], [4.5, 5, 6]]").unwrap();
        let a = to_array(&v, "m").unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a[[1, 0]], 4.5);
    }

    #[test]
    fn test_to_array_scalar() {
        let v: Value = serde_yaml::from_str("2.5").unwrap();
        let a = to_array(&v, "s").unwrap();
        assert_eq!(a.ndim(), 0);
        assert_eq!(a[[]], 2.5);
    }

    #[test]
    fn test_to_array_ragged() {
        let v: Value = serde_yaml::from_str("[[1, 2], [3]]").unwrap();
        assert!(to_array(&v, "r").is_err());

        let v: Value = serde_yaml::from_str("[1, [2, 3]]").unwrap();
        assert!(to_array(&v, "r").is_err());
    }

    #[test]
    fn test_to_array_non_numeric() {
        let v: Value = serde_yaml::from_str("[1, abc]").unwrap();
        let err = to_array(&v, "x").unwrap_err();
        assert!(matches!(err, EphError::InvalidValue { .. }));
    }

    #[test]
    fn test_require_missing() {
        let v: Value = serde_yaml::from_str("a: 1").unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(require_f64(m, "a", "test").unwrap(), 1.0);
        let err = require(m, "b", "test").unwrap_err();
        assert!(matches!(err, EphError::MissingKey { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_yaml_file(Path::new("/nonexistent/ephkit.yml")).unwrap_err();
        assert!(matches!(err, EphError::FileNotFound { .. }));
    }
}
