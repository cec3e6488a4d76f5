//! # 统一错误处理模块
//!
//! 定义 ephkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! 比较器的结构性错误 (`StructuralError`) 单独定义在 `compare/error.rs`，
//! 这里只做透明包装，数值差异从不走错误通道。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 使用 `compare/error.rs`

use crate::compare::StructuralError;
use thiserror::Error;

/// ephkit 统一错误类型
#[derive(Error, Debug)]
pub enum EphError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown {family} unit: '{name}'")]
    UnknownUnit { family: String, name: String },

    #[error("Calculation mode mismatch: expected '{expected}', found '{found}'")]
    InvalidCalcMode { expected: String, found: String },

    #[error("Missing required key '{key}' in {context}")]
    MissingKey { key: String, context: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 数据模型错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid point array shape {shape:?}: no axis of length 3")]
    ShapeError { shape: Vec<usize> },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Label not found: {0}")]
    LabelNotFound(String),

    #[error("No point matches {target} within tolerance (closest distance {closest:.6e})")]
    PointNotFound { target: String, closest: f64 },

    #[error("Cannot rescale a constant path (all coordinates equal {value})")]
    DegeneratePath { value: f64 },

    // ─────────────────────────────────────────────────────────────
    // 比较错误
    // ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("{failed} of {total} comparison(s) failed")]
    ComparisonFailed { failed: usize, total: usize },

    // ─────────────────────────────────────────────────────────────
    // CSV / YAML / HDF5 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, EphError>;
