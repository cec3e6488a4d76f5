//! # compare 命令实现
//!
//! 比较一对输出文件。
//!
//! ## 功能
//! - 读取 YAML/HDF5 为数据树
//! - 按容差策略递归比较
//! - 以表格列出每个失败叶子，可选导出完整 YAML 报告
//! - 结构性不匹配直接报错并指出路径
//!
//! ## 依赖关系
//! - 使用 `cli/compare.rs` 定义的参数
//! - 使用 `compare/`, `parsers/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::load_policy;
use crate::cli::compare::CompareArgs;
use crate::compare::{Comparator, Comparison};
use crate::error::{EphError, Result};
use crate::parsers;
use crate::utils::{output, progress};

use std::fs::File;
use std::path::Path;
use tabled::{Table, Tabled};

/// 差异表格行
#[derive(Debug, Clone, Tabled)]
pub(crate) struct DiffRow {
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

/// 将比较结果转成表格行
pub(crate) fn diff_rows(result: &Comparison) -> Vec<DiffRow> {
    result
        .failing_leaves()
        .into_iter()
        .map(|(path, diff)| DiffRow {
            path: crate::compare::display_path(path).to_string(),
            kind: diff.label().to_string(),
            detail: diff.describe(),
        })
        .collect()
}

/// 执行 compare 命令
pub fn execute(args: CompareArgs) -> Result<()> {
    output::print_header("Comparing Output Files");

    let policy = load_policy(args.policy.as_deref())?;

    let spinner = progress::create_spinner("Loading files...");
    let loaded = parsers::load_tree(&args.reference)
        .and_then(|r| parsers::load_tree(&args.candidate).map(|c| (r, c)));
    spinner.finish_and_clear();
    let (reference, candidate) = loaded?;

    output::print_info(&format!(
        "{} (reference) vs {}",
        args.reference.display(),
        args.candidate.display()
    ));

    let result = Comparator::new(&policy)
        .parallel(args.parallel)
        .compare(&reference, &candidate)
        .map_err(|e| {
            if let Some(path) = e.path() {
                output::print_diff_path(path, "structural mismatch");
            }
            EphError::from(e)
        })?;

    if let Some(report) = &args.report {
        write_report(&result, report)?;
        output::print_success(&format!("Diff report saved to '{}'", report.display()));
    }

    if result.equal {
        output::print_success("Files agree within tolerance");
        return Ok(());
    }

    let rows = diff_rows(&result);
    println!("{}", Table::new(&rows));
    output::print_separator();
    output::print_warning(&format!("{} value(s) outside tolerance", rows.len()));

    Err(EphError::ComparisonFailed {
        failed: 1,
        total: 1,
    })
}

/// 将完整比较结果写为 YAML
pub fn write_report(result: &Comparison, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| EphError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::to_writer(file, result)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, DataNode, TolerancePolicy};
    use serde_yaml::Value;
    use std::fs;

    fn tree(yaml: &str) -> DataNode {
        let v: Value = serde_yaml::from_str(yaml).unwrap();
        DataNode::from_yaml(&v)
    }

    #[test]
    fn test_diff_rows_and_report() {
        let result = compare(
            &tree("{a: 1.0, b: [1, 2], c: x}"),
            &tree("{a: 1.5, b: [1, 3], c: x}"),
            &TolerancePolicy::default(),
        )
        .unwrap();

        let rows = diff_rows(&result);
        let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b[1]"]);
        assert_eq!(rows[0].kind, "scalar");

        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("diff.yml");
        write_report(&result, &report).unwrap();
        let text = fs::read_to_string(&report).unwrap();
        assert!(text.contains("equal: false"));
        assert!(text.contains("b[1]"));
    }
}
