//! # 批量执行器
//!
//! 并行比较多对文件。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，结果保持输入顺序
//! - 进度条显示
//! - 通过、存在差异、无法比较三类结果的汇总
//!
//! 差异明细只在全部任务结束后统一打印，避免多线程输出交错。
//!
//! ## 依赖关系
//! - 被 `commands/testsuite.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{EphError, Result};
use crate::utils::progress;

use rayon::prelude::*;

/// 单对文件的比较结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    /// 在容差内一致
    Passed(String),
    /// 可以比较但存在差异：(名称, [(路径, 描述)])
    Differ(String, Vec<(String, String)>),
    /// 无法比较（文件缺失、解析失败、结构性不匹配）：(名称, 错误信息)
    Failed(String, String),
}

/// 批量结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub passed: usize,
    pub differ: usize,
    pub failed: usize,
    /// 差异明细
    pub diffs: Vec<(String, Vec<(String, String)>)>,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Passed(_) => self.passed += 1,
            ProcessResult::Differ(name, leaves) => {
                self.differ += 1;
                self.diffs.push((name, leaves));
            }
            ProcessResult::Failed(name, err) => {
                self.failed += 1;
                self.failures.push((name, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.passed + self.differ + self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.differ == 0 && self.failed == 0
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器（`jobs = 0` 使用全部 CPU）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理任务列表
    pub fn run<T, F>(&self, items: &[T], processor: F) -> Result<BatchResult>
    where
        T: Sync,
        F: Fn(&T) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(items.len() as u64, "Comparing");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| EphError::InvalidArgument(format!("Cannot build thread pool: {}", e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = processor(item);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        Ok(batch_result)
    }
}
