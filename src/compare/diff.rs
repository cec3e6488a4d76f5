//! # 差异记录
//!
//! 数值超差、字符串不同等“软”差异不会中断比较，而是累积为
//! [`DiffRecord`] 树：中间节点记录比较/失败的子项数与每个失败子路径，
//! 叶子记录具体数值，方便逐条打印。
//!
//! 失败子项按访问顺序保存：字典按键名，列表按下标（`y[2]` 在 `y[10]` 之前）。
//!
//! ## 依赖关系
//! - 被 `compare/engine.rs` 构造
//! - 被 `commands/compare.rs`, `commands/testsuite.rs` 打印与导出
//! - 使用 `serde`（YAML 报告）, `ndarray`

use super::policy::Tolerance;
use ndarray::{ArrayD, Dimension};
use serde::{Serialize, Serializer};

/// 相对差计算时参考值的下限
pub const REL_FLOOR: f64 = 1e-10;

/// 一条差异记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffRecord {
    /// 字典或列表：只保存失败的子项（完整路径, 记录），按访问顺序
    Node {
        compared: usize,
        failed: usize,
        #[serde(serialize_with = "ordered_map")]
        children: Vec<(String, DiffRecord)>,
    },
    /// 标量数值超差
    Scalar {
        reference: f64,
        candidate: f64,
        abs_diff: f64,
        /// 仅当 `|reference| > 1e-10` 时给出
        rel_diff_percent: Option<f64>,
        tolerance: Tolerance,
    },
    /// 数组超差：失败元素数，以及全部元素中最大绝对差与最大相对差所在位置
    Array {
        shape: Vec<usize>,
        failed_elements: usize,
        max_abs_diff: f64,
        max_abs_index: Vec<usize>,
        max_rel_diff_percent: f64,
        max_rel_index: Vec<usize>,
        max_rel_values: (f64, f64),
        tolerance: Tolerance,
    },
    /// 字符串或布尔值不同
    Mismatch { reference: String, candidate: String },
}

impl DiffRecord {
    /// 标量差异；两值在容差内时返回 None
    pub fn scalar(reference: f64, candidate: f64, tolerance: Tolerance) -> Option<DiffRecord> {
        if tolerance.is_close(reference, candidate) {
            return None;
        }
        let abs_diff = (reference - candidate).abs();
        let rel_diff_percent = if reference.abs() > REL_FLOOR {
            Some(abs_diff / reference.abs() * 100.0)
        } else {
            None
        };
        Some(DiffRecord::Scalar {
            reference,
            candidate,
            abs_diff,
            rel_diff_percent,
            tolerance,
        })
    }

    /// 逐元素比较两个同形数组；全部在容差内时返回 None
    ///
    /// 最大差值统计覆盖所有元素，包括因 `rtol` 而通过的元素。
    pub fn array(
        reference: &ArrayD<f64>,
        candidate: &ArrayD<f64>,
        tolerance: Tolerance,
    ) -> Option<DiffRecord> {
        let mut failed_elements = 0;
        let mut max_abs = (0.0_f64, Vec::new());
        let mut max_rel = (f64::NEG_INFINITY, Vec::new(), (0.0, 0.0));

        for ((idx, &a), &b) in reference.indexed_iter().zip(candidate.iter()) {
            if !tolerance.is_close(a, b) {
                failed_elements += 1;
            }

            let d = element_abs_diff(a, b);
            let rel = d / a.abs().max(REL_FLOOR) * 100.0;
            if max_abs.1.is_empty() || d > max_abs.0 {
                max_abs = (d, idx.slice().to_vec());
            }
            if max_rel.1.is_empty() || rel > max_rel.0 {
                max_rel = (rel, idx.slice().to_vec(), (a, b));
            }
        }

        if failed_elements == 0 {
            return None;
        }
        Some(DiffRecord::Array {
            shape: reference.shape().to_vec(),
            failed_elements,
            max_abs_diff: max_abs.0,
            max_abs_index: max_abs.1,
            max_rel_diff_percent: max_rel.0,
            max_rel_index: max_rel.1,
            max_rel_values: max_rel.2,
            tolerance,
        })
    }

    pub fn mismatch(reference: impl ToString, candidate: impl ToString) -> DiffRecord {
        DiffRecord::Mismatch {
            reference: reference.to_string(),
            candidate: candidate.to_string(),
        }
    }

    /// 由子项结果聚合；没有失败子项时返回 None
    pub fn node<I>(compared: usize, children: I) -> Option<DiffRecord>
    where
        I: IntoIterator<Item = (String, Option<DiffRecord>)>,
    {
        let children: Vec<(String, DiffRecord)> = children
            .into_iter()
            .filter_map(|(path, diff)| diff.map(|d| (path, d)))
            .collect();
        if children.is_empty() {
            return None;
        }
        Some(DiffRecord::Node {
            compared,
            failed: children.len(),
            children,
        })
    }

    /// 记录类型名
    pub fn label(&self) -> &'static str {
        match self {
            DiffRecord::Node { .. } => "node",
            DiffRecord::Scalar { .. } => "scalar",
            DiffRecord::Array { .. } => "array",
            DiffRecord::Mismatch { .. } => "value",
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, DiffRecord::Node { .. })
    }

    /// 单行描述，用于表格
    pub fn describe(&self) -> String {
        match self {
            DiffRecord::Node {
                compared, failed, ..
            } => format!("{}/{} children differ", failed, compared),
            DiffRecord::Scalar {
                reference,
                candidate,
                abs_diff,
                rel_diff_percent,
                ..
            } => match rel_diff_percent {
                Some(rel) => format!(
                    "{} vs {} (|d| = {:.3e}, {:.3e}%)",
                    reference, candidate, abs_diff, rel
                ),
                None => format!("{} vs {} (|d| = {:.3e})", reference, candidate, abs_diff),
            },
            DiffRecord::Array {
                shape,
                failed_elements,
                max_abs_diff,
                max_abs_index,
                max_rel_diff_percent,
                max_rel_index,
                max_rel_values,
                ..
            } => format!(
                "{} of {} elements differ; max |d| = {:.3e} at {:?}; max rel = {:.3e}% at {:?} ({} vs {})",
                failed_elements,
                shape.iter().product::<usize>(),
                max_abs_diff,
                max_abs_index,
                max_rel_diff_percent,
                max_rel_index,
                max_rel_values.0,
                max_rel_values.1
            ),
            DiffRecord::Mismatch {
                reference,
                candidate,
            } => format!("'{}' vs '{}'", reference, candidate),
        }
    }
}

/// 失败子项序列化为保持顺序的映射
fn ordered_map<S: Serializer>(
    children: &[(String, DiffRecord)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(children.iter().map(|(path, diff)| (path, diff)))
}

/// 单个元素的绝对差；只有一侧为 NaN 时记为无穷大
fn element_abs_diff(a: f64, b: f64) -> f64 {
    if a == b || (a.is_nan() && b.is_nan()) {
        return 0.0;
    }
    let d = (a - b).abs();
    if d.is_nan() {
        f64::INFINITY
    } else {
        d
    }
}

/// 一次比较的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub equal: bool,
    pub diff: Option<DiffRecord>,
}

impl Comparison {
    pub fn from_diff(diff: Option<DiffRecord>) -> Self {
        Comparison {
            equal: diff.is_none(),
            diff,
        }
    }

    /// 所有失败叶子（路径, 记录），按路径顺序
    pub fn failing_leaves(&self) -> Vec<(&str, &DiffRecord)> {
        let mut out = Vec::new();
        if let Some(diff) = &self.diff {
            collect_leaves("", diff, &mut out);
        }
        out
    }
}

fn collect_leaves<'a>(path: &'a str, diff: &'a DiffRecord, out: &mut Vec<(&'a str, &'a DiffRecord)>) {
    match diff {
        DiffRecord::Node { children, .. } => {
            for (child_path, child) in children {
                collect_leaves(child_path, child, out);
            }
        }
        leaf => out.push((path, leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_scalar_within_tolerance() {
        assert!(DiffRecord::scalar(1.0, 1.0 + 1e-9, Tolerance::default()).is_none());
    }

    #[test]
    fn test_scalar_relative_percent() {
        let d = DiffRecord::scalar(2.0, 2.5, Tolerance::new(0.1, 0.0)).unwrap();
        match d {
            DiffRecord::Scalar {
                abs_diff,
                rel_diff_percent,
                ..
            } => {
                assert!((abs_diff - 0.5).abs() < 1e-12);
                assert!((rel_diff_percent.unwrap() - 25.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scalar_near_zero_reference_has_no_relative() {
        let d = DiffRecord::scalar(0.0, 1.0, Tolerance::new(0.1, 0.0)).unwrap();
        assert!(matches!(
            d,
            DiffRecord::Scalar {
                rel_diff_percent: None,
                ..
            }
        ));
    }

    #[test]
    fn test_array_largest_diff() {
        let a = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let b = arr1(&[1.0, 2.0, 3.1]).into_dyn();
        let d = DiffRecord::array(&a, &b, Tolerance::new(0.05, 0.0)).unwrap();
        match d {
            DiffRecord::Array {
                max_abs_diff,
                max_abs_index,
                failed_elements,
                ..
            } => {
                assert!((max_abs_diff - 0.1).abs() < 1e-12);
                assert_eq!(max_abs_index, vec![2]);
                assert_eq!(failed_elements, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_array_max_abs_covers_passing_elements() {
        let a = arr1(&[1000.0, 1.0]).into_dyn();
        let b = arr1(&[1000.5, 1.01]).into_dyn();
        let d = DiffRecord::array(&a, &b, Tolerance::new(0.0, 1e-3)).unwrap();
        match d {
            DiffRecord::Array {
                failed_elements,
                max_abs_diff,
                max_abs_index,
                max_rel_index,
                ..
            } => {
                assert_eq!(failed_elements, 1);
                assert!((max_abs_diff - 0.5).abs() < 1e-9);
                assert_eq!(max_abs_index, vec![0]);
                assert_eq!(max_rel_index, vec![1]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_array_infinite_reference() {
        let a = arr1(&[f64::INFINITY, 2.0]).into_dyn();
        let b = arr1(&[0.0, 2.0]).into_dyn();
        match DiffRecord::array(&a, &b, Tolerance::default()).unwrap() {
            DiffRecord::Array {
                failed_elements,
                max_abs_diff,
                ..
            } => {
                assert_eq!(failed_elements, 1);
                assert!(max_abs_diff.is_infinite());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(DiffRecord::array(&a, &a.clone(), Tolerance::default()).is_none());
    }

    #[test]
    fn test_array_relative_uses_floor() {
        let a = arr2(&[[0.0, 10.0], [1.0, 1.0]]).into_dyn();
        let b = arr2(&[[1e-3, 10.5], [1.0, 1.0]]).into_dyn();
        let d = DiffRecord::array(&a, &b, Tolerance::new(1e-6, 0.0)).unwrap();
        match d {
            DiffRecord::Array {
                max_abs_index,
                max_rel_index,
                max_rel_values,
                failed_elements,
                ..
            } => {
                assert_eq!(failed_elements, 2);
                assert_eq!(max_abs_index, vec![0, 1]);
                assert_eq!(max_rel_index, vec![0, 0]);
                assert_eq!(max_rel_values, (0.0, 1e-3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_array_nan_equal_nan() {
        let a = arr1(&[f64::NAN, 1.0]).into_dyn();
        assert!(DiffRecord::array(&a, &a.clone(), Tolerance::new(0.0, 0.0)).is_none());

        let b = arr1(&[0.0, 1.0]).into_dyn();
        assert!(DiffRecord::array(&a, &b, Tolerance::default()).is_some());
    }

    #[test]
    fn test_node_and_failing_leaves() {
        let inner = DiffRecord::node(
            2,
            vec![
                ("a.x".to_string(), DiffRecord::scalar(1.0, 2.0, Tolerance::default())),
                ("a.y".to_string(), None),
            ],
        );
        let root = DiffRecord::node(
            2,
            vec![
                ("a".to_string(), inner),
                ("b".to_string(), Some(DiffRecord::mismatch("Si", "Ge"))),
            ],
        );
        let cmp = Comparison::from_diff(root);
        assert!(!cmp.equal);

        let leaves = cmp.failing_leaves();
        let paths: Vec<&str> = leaves.iter().map(|(p, _)| *p).collect();
        assert_eq!(paths, vec!["a.x", "b"]);
        assert!(leaves.iter().all(|(_, d)| d.is_leaf()));
    }

    #[test]
    fn test_node_keeps_visit_order() {
        let children = [2usize, 10].iter().map(|i| {
            (
                format!("y[{}]", i),
                DiffRecord::scalar(0.0, 1.0, Tolerance::default()),
            )
        });
        let cmp = Comparison::from_diff(DiffRecord::node(12, children));
        let paths: Vec<&str> = cmp.failing_leaves().iter().map(|(p, _)| *p).collect();
        assert_eq!(paths, vec!["y[2]", "y[10]"]);

        let yaml = serde_yaml::to_string(&cmp).unwrap();
        let first = yaml.find("y[2]").unwrap();
        let second = yaml.find("y[10]").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_node_all_equal_is_none() {
        assert!(DiffRecord::node(3, vec![("a".to_string(), None)]).is_none());
        assert!(Comparison::from_diff(None).equal);
    }

    #[test]
    fn test_describe() {
        let d = DiffRecord::mismatch(true, false);
        assert_eq!(d.describe(), "'true' vs 'false'");
    }
}
