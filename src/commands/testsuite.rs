//! # testsuite 命令实现
//!
//! 将参考目录中的每个输出文件与输出目录中的同名文件比较。
//!
//! ## 功能
//! - 按模式收集参考文件，按相对路径配对
//! - 并行比较，显示进度条
//! - 汇总表格 + 逐条打印每个失败路径
//! - 输出文件缺失、无法解析、结构不匹配都计为失败
//!
//! ## 依赖关系
//! - 使用 `cli/testsuite.rs` 定义的参数
//! - 使用 `batch/`, `compare/`, `parsers/`
//! - 使用 `utils/output.rs`

use super::load_policy;
use crate::batch::{BatchResult, BatchRunner, FileCollector, FilePair, ProcessResult};
use crate::cli::testsuite::TestsuiteArgs;
use crate::compare::{display_path, Comparator, TolerancePolicy};
use crate::error::{EphError, Result};
use crate::parsers;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 汇总表格行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// 执行 testsuite 命令
pub fn execute(args: TestsuiteArgs) -> Result<()> {
    output::print_header("Running Testsuite");

    if !args.reference_dir.is_dir() {
        return Err(EphError::DirectoryNotFound {
            path: args.reference_dir.display().to_string(),
        });
    }
    if !args.output_dir.is_dir() {
        return Err(EphError::DirectoryNotFound {
            path: args.output_dir.display().to_string(),
        });
    }

    let policy = load_policy(args.policy.as_deref())?;

    let pairs = FileCollector::new(args.reference_dir.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .pair_with(&args.output_dir)?;

    if pairs.is_empty() {
        return Err(EphError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} reference file(s), comparing with {} job(s)",
        pairs.len(),
        runner.jobs()
    ));

    let result = runner.run(&pairs, |pair| compare_pair(pair, &policy))?;

    report(&result);

    if result.all_passed() {
        output::print_done(&format!("All {} comparison(s) passed", result.total()));
        Ok(())
    } else {
        Err(EphError::ComparisonFailed {
            failed: result.differ + result.failed,
            total: result.total(),
        })
    }
}

/// 比较一对文件
pub fn compare_pair(pair: &FilePair, policy: &TolerancePolicy) -> ProcessResult {
    let name = pair.relative.display().to_string();

    if !pair.candidate.exists() {
        return ProcessResult::Failed(
            name,
            format!("missing output file {}", pair.candidate.display()),
        );
    }

    let trees = parsers::load_tree(&pair.reference)
        .and_then(|r| parsers::load_tree(&pair.candidate).map(|c| (r, c)));
    let (reference, candidate) = match trees {
        Ok(t) => t,
        Err(e) => return ProcessResult::Failed(name, e.to_string()),
    };

    match Comparator::new(policy).compare(&reference, &candidate) {
        Ok(result) if result.equal => {
            log::debug!("{}: passed", name);
            ProcessResult::Passed(name)
        }
        Ok(result) => {
            let leaves = result
                .failing_leaves()
                .into_iter()
                .map(|(path, diff)| (display_path(path).to_string(), diff.describe()))
                .collect();
            ProcessResult::Differ(name, leaves)
        }
        Err(e) => ProcessResult::Failed(name, e.to_string()),
    }
}

/// 打印汇总表格与所有失败路径
fn report(result: &BatchResult) {
    let mut rows: Vec<SummaryRow> = result
        .diffs
        .iter()
        .map(|(file, leaves)| SummaryRow {
            file: file.clone(),
            status: "DIFF".to_string(),
            detail: format!("{} value(s) outside tolerance", leaves.len()),
        })
        .collect();
    rows.extend(result.failures.iter().map(|(file, err)| SummaryRow {
        file: file.clone(),
        status: "FAIL".to_string(),
        detail: err.clone(),
    }));

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }

    for (file, leaves) in &result.diffs {
        output::print_header(file);
        for (path, detail) in leaves {
            output::print_diff_path(path, detail);
        }
    }

    output::print_separator();
    output::print_info(&format!(
        "{} passed, {} differ, {} failed (of {})",
        result.passed,
        result.differ,
        result.failed,
        result.total()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_compare_pair_outcomes() {
        let reference = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(reference.path(), "same.yml", "e: [1.0, 2.0]\n");
        write(output.path(), "same.yml", "e: [1.0, 2.0]\n");
        write(reference.path(), "drift.yml", "e: [1.0, 2.0]\n");
        write(output.path(), "drift.yml", "e: [1.0, 2.5]\n");
        write(reference.path(), "shape.yml", "e: [1.0, 2.0]\n");
        write(output.path(), "shape.yml", "e: [1.0]\n");
        write(reference.path(), "lost.yml", "e: 1.0\n");

        let pairs = FileCollector::new(reference.path().to_path_buf())
            .pair_with(output.path())
            .unwrap();
        assert_eq!(pairs.len(), 4);

        let policy = TolerancePolicy::default();
        let outcomes: Vec<ProcessResult> =
            pairs.iter().map(|p| compare_pair(p, &policy)).collect();

        // pairs are sorted: drift, lost, same, shape
        match &outcomes[0] {
            ProcessResult::Differ(name, leaves) => {
                assert_eq!(name, "drift.yml");
                assert_eq!(leaves.len(), 1);
                assert_eq!(leaves[0].0, "e[1]");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&outcomes[1], ProcessResult::Failed(_, msg) if msg.contains("missing")));
        assert_eq!(outcomes[2], ProcessResult::Passed("same.yml".to_string()));
        assert!(matches!(&outcomes[3], ProcessResult::Failed(_, msg) if msg.contains("lengths differ")));
    }

    #[test]
    fn test_runner_with_pairs() {
        let reference = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        for i in 0..6 {
            let name = format!("run{}.yml", i);
            write(reference.path(), &name, "x: 1.0\n");
            write(output.path(), &name, if i == 3 { "x: 2.0\n" } else { "x: 1.0\n" });
        }

        let pairs = FileCollector::new(reference.path().to_path_buf())
            .pair_with(output.path())
            .unwrap();
        let policy = TolerancePolicy::default();
        let result = BatchRunner::new(2)
            .run(&pairs, |p| compare_pair(p, &policy))
            .unwrap();

        assert_eq!(result.passed, 5);
        assert_eq!(result.differ, 1);
        assert_eq!(result.diffs[0].0, "run3.yml");
    }
}
