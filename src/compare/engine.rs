//! # 递归结构比较器
//!
//! 对两棵 [`DataNode`] 树逐键递归比较：
//!
//! | 情况 | 处理 |
//! |------|------|
//! | 类型不同 / 键集合不同 / 列表长度不同 / 数组形状不同 / 不支持的类型 | `Err(StructuralError)`，立即中止 |
//! | 数值超差 / 字符串不同 / 布尔不同 | 记录为 [`DiffRecord`]，继续比较 |
//!
//! 路径约定：根路径为空串，字典子项 `path.key`，列表元素 `path[i]`。
//! 容差按最近一层字典键查找，列表元素与数组元素沿用其外层键。
//!
//! ## 依赖关系
//! - 使用 `compare/tree.rs`, `compare/policy.rs`, `compare/diff.rs`, `compare/error.rs`
//! - 使用 `rayon`（可选并行比较顶层键）

use super::diff::{Comparison, DiffRecord};
use super::error::StructuralError;
use super::policy::TolerancePolicy;
use super::tree::DataNode;

use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// 比较器
pub struct Comparator<'a> {
    policy: &'a TolerancePolicy,
    parallel: bool,
}

impl<'a> Comparator<'a> {
    pub fn new(policy: &'a TolerancePolicy) -> Self {
        Comparator {
            policy,
            parallel: false,
        }
    }

    /// 顶层各键是否并行比较
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 比较两棵树，`reference` 为容差计算的参考值
    pub fn compare(
        &self,
        reference: &DataNode,
        candidate: &DataNode,
    ) -> Result<Comparison, StructuralError> {
        let (reference, candidate) = self.restrict(reference, candidate)?;
        let diff = self.compare_node(&reference, &candidate, "", None, self.parallel)?;
        Ok(Comparison::from_diff(diff))
    }

    /// 按 `test keywords` 白名单截取两棵树的顶层键
    fn restrict<'n>(
        &self,
        reference: &'n DataNode,
        candidate: &'n DataNode,
    ) -> Result<(Cow<'n, DataNode>, Cow<'n, DataNode>), StructuralError> {
        let (Some(keywords), Some(ref_dict), Some(cand_dict)) = (
            self.policy.test_keywords.as_ref(),
            reference.as_dict(),
            candidate.as_dict(),
        ) else {
            return Ok((Cow::Borrowed(reference), Cow::Borrowed(candidate)));
        };

        let keep = |dict: &BTreeMap<String, DataNode>| -> BTreeMap<String, DataNode> {
            dict.iter()
                .filter(|(k, _)| keywords.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        let ref_kept = keep(ref_dict);
        let cand_kept = keep(cand_dict);

        if ref_kept.is_empty() || cand_kept.is_empty() {
            return Err(StructuralError::EmptyComparison {
                keywords: keywords.iter().cloned().collect(),
            });
        }
        log::debug!(
            "restricted comparison to {} of {} top-level keys",
            ref_kept.len(),
            ref_dict.len()
        );
        Ok((
            Cow::Owned(DataNode::Dict(ref_kept)),
            Cow::Owned(DataNode::Dict(cand_kept)),
        ))
    }

    fn compare_node(
        &self,
        a: &DataNode,
        b: &DataNode,
        path: &str,
        key: Option<&str>,
        parallel: bool,
    ) -> Result<Option<DiffRecord>, StructuralError> {
        if a.kind() != b.kind() {
            return Err(StructuralError::TypeMismatch {
                path: path.to_string(),
                left: a.kind().to_string(),
                right: b.kind().to_string(),
            });
        }

        match (a, b) {
            (DataNode::Dict(da), DataNode::Dict(db)) => self.compare_dict(da, db, path, parallel),
            (DataNode::List(la), DataNode::List(lb)) => {
                if la.len() != lb.len() {
                    return Err(StructuralError::LengthMismatch {
                        path: path.to_string(),
                        left: la.len(),
                        right: lb.len(),
                    });
                }
                let children = la
                    .iter()
                    .zip(lb)
                    .enumerate()
                    .map(|(i, (x, y))| {
                        let child_path = format!("{}[{}]", path, i);
                        let diff = self.compare_node(x, y, &child_path, key, false)?;
                        Ok((child_path, diff))
                    })
                    .collect::<Result<Vec<_>, StructuralError>>()?;
                Ok(DiffRecord::node(la.len(), children))
            }
            (DataNode::Number(x), DataNode::Number(y)) => {
                Ok(DiffRecord::scalar(*x, *y, self.policy.tolerance_for(key)))
            }
            (DataNode::Array(x), DataNode::Array(y)) => {
                if x.shape() != y.shape() {
                    return Err(StructuralError::ShapeMismatch {
                        path: path.to_string(),
                        left: x.shape().to_vec(),
                        right: y.shape().to_vec(),
                    });
                }
                Ok(DiffRecord::array(x, y, self.policy.tolerance_for(key)))
            }
            (DataNode::Str(x), DataNode::Str(y)) => {
                Ok((x != y).then(|| DiffRecord::mismatch(x, y)))
            }
            (DataNode::Bool(x), DataNode::Bool(y)) => {
                Ok((x != y).then(|| DiffRecord::mismatch(x, y)))
            }
            (DataNode::Null, DataNode::Null) => Ok(None),
            _ => Err(StructuralError::UnsupportedType {
                path: path.to_string(),
                type_name: a.kind().to_string(),
            }),
        }
    }

    fn compare_dict(
        &self,
        da: &BTreeMap<String, DataNode>,
        db: &BTreeMap<String, DataNode>,
        path: &str,
        parallel: bool,
    ) -> Result<Option<DiffRecord>, StructuralError> {
        let keys_a: BTreeSet<&str> = da
            .keys()
            .map(String::as_str)
            .filter(|k| !self.policy.is_ignored(k))
            .collect();
        let keys_b: BTreeSet<&str> = db
            .keys()
            .map(String::as_str)
            .filter(|k| !self.policy.is_ignored(k))
            .collect();

        if keys_a != keys_b {
            return Err(StructuralError::KeySetMismatch {
                path: path.to_string(),
                only_left: keys_a.difference(&keys_b).map(|k| k.to_string()).collect(),
                only_right: keys_b.difference(&keys_a).map(|k| k.to_string()).collect(),
            });
        }

        let compare_child = |key: &&str| -> Result<(String, Option<DiffRecord>), StructuralError> {
            let child_path = join_path(path, key);
            let diff = self.compare_node(&da[*key], &db[*key], &child_path, Some(*key), false)?;
            Ok((child_path, diff))
        };

        let keys: Vec<&str> = keys_a.into_iter().collect();
        let children = if parallel {
            keys.par_iter()
                .map(compare_child)
                .collect::<Result<Vec<_>, StructuralError>>()?
        } else {
            keys.iter()
                .map(compare_child)
                .collect::<Result<Vec<_>, StructuralError>>()?
        };
        Ok(DiffRecord::node(keys.len(), children))
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// 便捷函数：串行比较
pub fn compare(
    reference: &DataNode,
    candidate: &DataNode,
    policy: &TolerancePolicy,
) -> Result<Comparison, StructuralError> {
    Comparator::new(policy).compare(reference, candidate)
}
