//! # 文件收集器
//!
//! 在参考目录中按模式收集输出文件，并与候选目录中同一相对路径的文件配对。
//!
//! ## 功能
//! - 逗号分隔的多个 glob 模式
//! - 递归目录搜索
//! - 只保留可比较的扩展名（.yml/.yaml/.h5/.hdf5）
//!
//! ## 依赖关系
//! - 被 `commands/testsuite.rs` 调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use crate::error::{EphError, Result};
use crate::parsers::is_supported_extension;

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一对待比较文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// 相对参考目录的路径，用于显示
    pub relative: PathBuf,
    pub reference: PathBuf,
    pub candidate: PathBuf,
}

/// 文件收集器
pub struct FileCollector {
    /// 参考目录
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<String>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec!["*".to_string()],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec!["*".to_string()];
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }
        if !self.input.is_dir() {
            return Err(EphError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    EphError::InvalidArgument(format!("Invalid pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| matches_any(&patterns, e.path()))
            .filter(|e| is_supported_extension(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        Ok(files)
    }

    /// 收集文件并与 `candidate_dir` 中同一相对路径配对
    pub fn pair_with(&self, candidate_dir: &Path) -> Result<Vec<FilePair>> {
        let files = self.collect()?;
        let base = if self.input.is_file() {
            self.input.parent().unwrap_or(Path::new(""))
        } else {
            self.input.as_path()
        };

        Ok(files
            .into_iter()
            .map(|reference| {
                let relative = reference
                    .strip_prefix(base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| reference.clone());
                FilePair {
                    candidate: candidate_dir.join(&relative),
                    relative,
                    reference,
                }
            })
            .collect())
    }
}

/// 检查文件名是否匹配任一模式
fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    patterns.iter().any(|p| p.matches(filename))
}
