//! # 比较器结构性错误
//!
//! 两棵树在某一路径上根本不可比（类型、键集合、长度、形状不同，
//! 或出现不支持的值类型）时抛出，立即中止整个比较。
//! 数值超出容差不属于此类，见 `compare/diff.rs`。
//!
//! ## 依赖关系
//! - 被 `compare/engine.rs` 使用
//! - 被 `error.rs` 包装

use thiserror::Error;

/// 显示用路径：根路径显示为 `<root>`
pub fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// 结构性不匹配
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Type mismatch at '{}': {left} vs {right}", display_path(.path))]
    TypeMismatch {
        path: String,
        left: String,
        right: String,
    },

    #[error(
        "Key sets differ at '{}': only in first {only_left:?}, only in second {only_right:?}",
        display_path(.path)
    )]
    KeySetMismatch {
        path: String,
        only_left: Vec<String>,
        only_right: Vec<String>,
    },

    #[error("List lengths differ at '{}': {left} vs {right}", display_path(.path))]
    LengthMismatch {
        path: String,
        left: usize,
        right: usize,
    },

    #[error("Array shapes differ at '{}': {left:?} vs {right:?}", display_path(.path))]
    ShapeMismatch {
        path: String,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("Unsupported value type '{type_name}' at '{}'", display_path(.path))]
    UnsupportedType { path: String, type_name: String },

    #[error("Nothing left to compare after restricting to test keywords {keywords:?}")]
    EmptyComparison { keywords: Vec<String> },
}

impl StructuralError {
    /// 出错路径（空比较没有路径）
    pub fn path(&self) -> Option<&str> {
        match self {
            StructuralError::TypeMismatch { path, .. }
            | StructuralError::KeySetMismatch { path, .. }
            | StructuralError::LengthMismatch { path, .. }
            | StructuralError::ShapeMismatch { path, .. }
            | StructuralError::UnsupportedType { path, .. } => Some(path),
            StructuralError::EmptyComparison { .. } => None,
        }
    }
}
