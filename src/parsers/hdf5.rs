//! # HDF5 读取（feature = "hdf5"）
//!
//! 将 HDF5 文件递归转换为 [`DataNode`]：
//! - 组 → `Dict`
//! - 0 维数值数据集 → `Number`，N 维 → `Array`
//! - 变长字符串 → `Str`，布尔标量 → `Bool`
//! - 其它类型 → `Other`（比较时报 `UnsupportedType`）
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `hdf5`, `ndarray`

use crate::compare::DataNode;
use crate::error::Result;

use hdf5::types::{TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use std::collections::BTreeMap;
use std::path::Path;

/// 读取整个 HDF5 文件
pub fn read_hdf5_file(path: &Path) -> Result<DataNode> {
    let file = File::open(path)?;
    let tree = read_group(&file)?;
    file.close()?;
    Ok(tree)
}

fn short_name(full: &str) -> String {
    full.rsplit('/').next().unwrap_or(full).to_string()
}

fn read_group(group: &Group) -> Result<DataNode> {
    let mut out = BTreeMap::new();
    for sub in group.groups()? {
        out.insert(short_name(&sub.name()), read_group(&sub)?);
    }
    for ds in group.datasets()? {
        out.insert(short_name(&ds.name()), read_dataset(&ds)?);
    }
    Ok(DataNode::Dict(out))
}

fn read_dataset(ds: &Dataset) -> Result<DataNode> {
    let descriptor = ds.dtype()?.to_descriptor()?;
    let node = match descriptor {
        TypeDescriptor::Float(_) => numeric(ds.read_dyn::<f64>()?),
        TypeDescriptor::Integer(_) => numeric(ds.read_dyn::<i64>()?.mapv(|x| x as f64)),
        TypeDescriptor::Unsigned(_) => numeric(ds.read_dyn::<u64>()?.mapv(|x| x as f64)),
        TypeDescriptor::Boolean if ds.ndim() == 0 => DataNode::Bool(ds.read_scalar::<bool>()?),
        TypeDescriptor::VarLenUnicode if ds.ndim() == 0 => {
            DataNode::Str(ds.read_scalar::<VarLenUnicode>()?.as_str().to_string())
        }
        TypeDescriptor::VarLenAscii if ds.ndim() == 0 => {
            DataNode::Str(ds.read_scalar::<VarLenAscii>()?.as_str().to_string())
        }
        other => DataNode::Other(format!("hdf5 {:?}", other)),
    };
    Ok(node)
}

fn numeric(arr: ndarray::ArrayD<f64>) -> DataNode {
    if arr.ndim() == 0 {
        match arr.iter().next() {
            Some(x) => DataNode::Number(*x),
            None => DataNode::Array(arr),
        }
    } else {
        DataNode::Array(arr)
    }
}
