//! # 文件读取模块
//!
//! 模拟程序输出 YAML 与 HDF5 两种格式。比较路径只需要通用的数据树，
//! 由 [`load_tree`] 按扩展名分派；计算记录路径直接使用 `yaml` 子模块。
//!
//! ## 依赖关系
//! - 被 `calc/`, `models/`, `commands/`, `batch/` 使用
//! - 子模块: yaml, hdf5 (feature = "hdf5")

#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod yaml;

use crate::compare::DataNode;
use crate::error::{EphError, Result};
use std::path::Path;

/// 从文件路径推断格式并读取为数据树
pub fn load_tree(path: &Path) -> Result<DataNode> {
    if !path.exists() {
        return Err(EphError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "yml" | "yaml" => {
            let value = yaml::read_yaml_file(path)?;
            Ok(DataNode::from_yaml(&value))
        }
        #[cfg(feature = "hdf5")]
        "h5" | "hdf5" => hdf5::read_hdf5_file(path),
        #[cfg(not(feature = "hdf5"))]
        "h5" | "hdf5" => Err(EphError::UnsupportedFormat(format!(
            "{} (rebuild with the `hdf5` feature to read HDF5 files)",
            path.display()
        ))),
        _ => Err(EphError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}

/// 是否为可比较的文件扩展名
pub fn is_supported_extension(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref(),
        Some("yml" | "yaml" | "h5" | "hdf5")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_yaml_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("si_bands.yml");
        fs::write(&path, "basic data:\n  alat: 10.26\n").unwrap();

        let tree = load_tree(&path).unwrap();
        assert_eq!(tree.lookup("basic data.alat"), Some(&DataNode::Number(10.26)));
    }

    #[test]
    fn test_load_missing_and_unknown() {
        let err = load_tree(Path::new("/nonexistent/out.yml")).unwrap_err();
        assert!(matches!(err, EphError::FileNotFound { .. }));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            load_tree(&path).unwrap_err(),
            EphError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_supported_extension() {
        assert!(is_supported_extension(Path::new("a/b.YML")));
        assert!(is_supported_extension(Path::new("x.h5")));
        assert!(!is_supported_extension(Path::new("x.out")));
    }
}
