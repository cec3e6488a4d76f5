//! # 比较用数据树
//!
//! YAML 与 HDF5 文件统一转换为 [`DataNode`]。类型集合是封闭的：
//! 字典、列表、数值、字符串、空值、布尔、多维数组；
//! 其余类型（YAML tag、复数数据集等）记为 `Other`，
//! 由比较器以 `UnsupportedType` 拒绝。
//!
//! ## 依赖关系
//! - 被 `compare/engine.rs`, `parsers/` 使用
//! - 使用 `serde_yaml`, `ndarray`

use crate::parsers::yaml::key_to_string;
use ndarray::ArrayD;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// 数据树节点
#[derive(Debug, Clone, PartialEq)]
pub enum DataNode {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<DataNode>),
    Dict(BTreeMap<String, DataNode>),
    Array(ArrayD<f64>),
    /// 不支持的类型，保存类型名
    Other(String),
}

impl DataNode {
    /// 类型名，用于类型检查与错误信息
    pub fn kind(&self) -> &str {
        match self {
            DataNode::Null => "null",
            DataNode::Bool(_) => "bool",
            DataNode::Number(_) => "number",
            DataNode::Str(_) => "string",
            DataNode::List(_) => "list",
            DataNode::Dict(_) => "dict",
            DataNode::Array(_) => "array",
            DataNode::Other(name) => name,
        }
    }

    /// 从 YAML 值转换
    ///
    /// 映射的键统一转为字符串；无法转换的键（列表、映射作键）使整个映射记为 `Other`。
    pub fn from_yaml(v: &Value) -> DataNode {
        match v {
            Value::Null => DataNode::Null,
            Value::Bool(b) => DataNode::Bool(*b),
            Value::Number(n) => match n.as_f64() {
                Some(x) => DataNode::Number(x),
                None => DataNode::Other("number".to_string()),
            },
            Value::String(s) => DataNode::Str(s.clone()),
            Value::Sequence(seq) => DataNode::List(seq.iter().map(DataNode::from_yaml).collect()),
            Value::Mapping(m) => {
                let mut out = BTreeMap::new();
                for (k, item) in m {
                    match key_to_string(k) {
                        Some(key) => {
                            out.insert(key, DataNode::from_yaml(item));
                        }
                        None => return DataNode::Other("mapping with complex keys".to_string()),
                    }
                }
                DataNode::Dict(out)
            }
            Value::Tagged(t) => DataNode::Other(format!("tagged value {}", t.tag)),
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, DataNode>> {
        match self {
            DataNode::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// 按点分路径查找子节点（不支持列表下标）
    pub fn lookup(&self, path: &str) -> Option<&DataNode> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |node, key| node.as_dict().and_then(|d| d.get(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_kinds() {
        let yaml = r#"
name: silicon
alat: 10.26
nk: 4
flag: true
missing: ~
list: [1, 2.5]
nested:
  1: [[0.0, 0.5]]
"#;
        let v: Value = serde_yaml::from_str(yaml).unwrap();
        let node = DataNode::from_yaml(&v);
        let d = node.as_dict().unwrap();

        assert_eq!(d["name"], DataNode::Str("silicon".to_string()));
        assert_eq!(d["alat"], DataNode::Number(10.26));
        assert_eq!(d["nk"], DataNode::Number(4.0));
        assert_eq!(d["flag"], DataNode::Bool(true));
        assert_eq!(d["missing"], DataNode::Null);
        assert_eq!(d["list"].kind(), "list");
        assert!(node.lookup("nested.1").is_some());
    }

    #[test]
    fn test_tagged_is_other() {
        let v: Value = serde_yaml::from_str("x: !complex 1+2j").unwrap();
        let node = DataNode::from_yaml(&v);
        let x = node.lookup("x").unwrap();
        assert!(matches!(x, DataNode::Other(_)));
        assert!(x.kind().starts_with("tagged value"));
    }

    #[test]
    fn test_lookup_missing() {
        let v: Value = serde_yaml::from_str("a: {b: 1}").unwrap();
        let node = DataNode::from_yaml(&v);
        assert_eq!(node.lookup("a.b"), Some(&DataNode::Number(1.0)));
        assert_eq!(node.lookup("a.c"), None);
        assert_eq!(node.lookup("a.b.c"), None);
    }
}
