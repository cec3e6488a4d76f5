//! # `dynamics-run` 模式记录
//!
//! 超快载流子动力学的 YAML 只记录时间轴与快照文件名，
//! 各时刻的占据数存放在同目录的 HDF5 伴随文件中：
//!
//! ```yaml
//! dynamics-run:
//!   time units: fs
//!   time step: 1.0
//!   number of snapshots: 11
//!   hdf5 file: si_cdyna.h5
//! ```
//!
//! 伴随文件布局为 `dynamics_run/snap_t_<i>`，每个数据集是二维数组。
//! 读取伴随文件需要 `hdf5` feature：[`DynamicsData::open`] 打开句柄，
//! 调用方读完后用 [`DynamicsData::close`] 关闭。
//!
//! ## 依赖关系
//! - 被 `calc/mod.rs` 的 `load_record` 使用
//! - 使用 `models/units.rs`, `parsers/yaml.rs`，可选 `hdf5`

use super::{open_record, CalcHeader, CalcMode};
use crate::error::{EphError, Result};
use crate::models::units::UnitFamily;
use crate::parsers::yaml::{require, require_f64, require_mapping, require_str};

use ndarray::Array1;
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};

/// 快照所在的组
pub const SNAPSHOT_GROUP: &str = "dynamics_run";

/// 第 `step` 个快照的数据集名
pub fn snapshot_name(step: usize) -> String {
    format!("snap_t_{}", step)
}

/// 超快动力学记录
#[derive(Debug, Clone)]
pub struct Dynamics {
    pub header: CalcHeader,
    pub time_step: f64,
    pub time_units: &'static str,
    pub num_snapshots: usize,
    /// 伴随 HDF5 文件，已按 YAML 所在目录解析
    pub hdf5_file: PathBuf,
}

impl Dynamics {
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let root = open_record(path, CalcMode::Dynamics)?;
        Dynamics::from_root(&root, &path.display().to_string())
    }

    pub fn from_root(root: &Mapping, origin: &str) -> Result<Self> {
        let header = CalcHeader::from_root(root, origin)?;
        let block = require_mapping(root, "dynamics-run", origin)?;

        let time_step = require_f64(block, "time step", origin)?;
        if !(time_step > 0.0) {
            return Err(EphError::InvalidValue {
                key: "time step".to_string(),
                reason: format!("must be positive, got {}", time_step),
            });
        }
        let time_units = UnitFamily::Time.canonicalize(require_str(block, "time units", origin)?)?;
        let num_snapshots = require(block, "number of snapshots", origin)?
            .as_u64()
            .ok_or_else(|| EphError::InvalidValue {
                key: "number of snapshots".to_string(),
                reason: "expected a non-negative integer".to_string(),
            })? as usize;

        let name = require_str(block, "hdf5 file", origin)?;
        let hdf5_file = match Path::new(origin).parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };

        Ok(Dynamics {
            header,
            time_step,
            time_units,
            num_snapshots,
            hdf5_file,
        })
    }

    /// 时间步长换算到目标单位
    pub fn time_step_in(&self, target: &str) -> Result<f64> {
        let target = UnitFamily::Time.canonicalize(target)?;
        Ok(self.time_step * UnitFamily::Time.factor(self.time_units, target)?)
    }

    /// 各快照时刻，从 0 开始
    pub fn times(&self) -> Array1<f64> {
        Array1::from_iter((0..self.num_snapshots).map(|i| i as f64 * self.time_step))
    }

    /// 打开伴随文件并核对快照数
    #[cfg(feature = "hdf5")]
    pub fn open_data(&self) -> Result<DynamicsData> {
        let data = DynamicsData::open(&self.hdf5_file)?;
        let found = data.num_snapshots()?;
        if found != self.num_snapshots {
            data.close()?;
            return Err(EphError::InvalidValue {
                key: "number of snapshots".to_string(),
                reason: format!(
                    "record declares {} but {} holds {}",
                    self.num_snapshots,
                    self.hdf5_file.display(),
                    found
                ),
            });
        }
        Ok(data)
    }
}

/// 伴随 HDF5 文件的读取句柄
#[cfg(feature = "hdf5")]
pub struct DynamicsData {
    file: hdf5::File,
}

#[cfg(feature = "hdf5")]
impl DynamicsData {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EphError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let file = hdf5::File::open(path)?;
        log::debug!("opened dynamics data {}", path.display());
        Ok(DynamicsData { file })
    }

    pub fn num_snapshots(&self) -> Result<usize> {
        let group = self.file.group(SNAPSHOT_GROUP)?;
        let count = group
            .member_names()?
            .iter()
            .filter(|name| name.starts_with("snap_t_"))
            .count();
        Ok(count)
    }

    /// 读取第 `step` 个快照
    pub fn snapshot(&self, step: usize) -> Result<ndarray::Array2<f64>> {
        let group = self.file.group(SNAPSHOT_GROUP)?;
        let name = snapshot_name(step);
        if !group.link_exists(&name) {
            return Err(EphError::KeyNotFound(format!("{}/{}", SNAPSHOT_GROUP, name)));
        }
        Ok(group.dataset(&name)?.read_2d::<f64>()?)
    }

    pub fn close(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::header::fixtures::SILICON_HEADER;
    use serde_yaml::Value;
    use std::fs;

    const BODY: &str = r#"
input parameters:
  calc_mode: dynamics-run
dynamics-run:
  time units: fs
  time step: 2.0
  number of snapshots: 3
  hdf5 file: si_cdyna.h5
"#;

    fn dynamics(origin: &str) -> Dynamics {
        let v: Value = serde_yaml::from_str(&format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        Dynamics::from_root(v.as_mapping().unwrap(), origin).unwrap()
    }

    #[test]
    fn test_time_axis() {
        let d = dynamics("run/si_dyna.yml");
        assert_eq!(d.num_snapshots, 3);
        assert_eq!(d.times().to_vec(), vec![0.0, 2.0, 4.0]);
        assert!((d.time_step_in("ps").unwrap() - 2.0e-3).abs() < 1e-15);
        assert_eq!(d.hdf5_file, Path::new("run").join("si_cdyna.h5"));
    }

    #[test]
    fn test_non_positive_time_step() {
        let body = BODY.replace("time step: 2.0", "time step: 0.0");
        let v: Value = serde_yaml::from_str(&format!("{}{}", SILICON_HEADER, body)).unwrap();
        let err = Dynamics::from_root(v.as_mapping().unwrap(), "x.yml").unwrap_err();
        assert!(matches!(err, EphError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_yaml_checks_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("si_dyna.yml");
        fs::write(&path, format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        let d = Dynamics::from_yaml(&path).unwrap();
        assert_eq!(d.hdf5_file, dir.path().join("si_cdyna.h5"));

        let wrong = dir.path().join("si_trans.yml");
        fs::write(
            &wrong,
            format!(
                "{}{}",
                SILICON_HEADER,
                BODY.replace("calc_mode: dynamics-run", "calc_mode: trans")
            ),
        )
        .unwrap();
        match Dynamics::from_yaml(&wrong).unwrap_err() {
            EphError::InvalidCalcMode { expected, found } => {
                assert_eq!(expected, "dynamics-run");
                assert_eq!(found, "trans");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(feature = "hdf5")]
    fn write_snapshots(path: &Path, count: usize) {
        let file = hdf5::File::create(path).unwrap();
        let group = file.create_group(SNAPSHOT_GROUP).unwrap();
        for i in 0..count {
            let occ = ndarray::Array2::from_elem((2, 4), 0.1 * i as f64);
            group
                .new_dataset_builder()
                .with_data(&occ)
                .create(snapshot_name(i).as_str())
                .unwrap();
        }
        file.close().unwrap();
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn test_open_read_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("si_dyna.yml");
        fs::write(&path, format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        write_snapshots(&dir.path().join("si_cdyna.h5"), 3);

        let d = Dynamics::from_yaml(&path).unwrap();
        let data = d.open_data().unwrap();
        assert_eq!(data.num_snapshots().unwrap(), 3);
        let last = data.snapshot(2).unwrap();
        assert_eq!(last.dim(), (2, 4));
        assert!((last[[1, 3]] - 0.2).abs() < 1e-12);
        assert!(matches!(
            data.snapshot(3).unwrap_err(),
            EphError::KeyNotFound(_)
        ));
        data.close().unwrap();
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn test_snapshot_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("si_dyna.yml");
        fs::write(&path, format!("{}{}", SILICON_HEADER, BODY)).unwrap();
        write_snapshots(&dir.path().join("si_cdyna.h5"), 2);

        let d = Dynamics::from_yaml(&path).unwrap();
        assert!(matches!(
            d.open_data().unwrap_err(),
            EphError::InvalidValue { .. }
        ));
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn test_missing_companion() {
        let d = dynamics("nowhere/si_dyna.yml");
        assert!(matches!(
            d.open_data().unwrap_err(),
            EphError::FileNotFound { .. }
        ));
    }
}
