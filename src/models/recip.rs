//! # 倒空间点数据库
//!
//! 同时保存一组 k/q 点的 crystal 与 cartesian 两种表示，
//! 以及一维作图用的路径坐标和高对称点标签。
//!
//! ## 设计要点
//! - 两种表示在构造时一次算好，之后切换「活动表示」不搬动任何数据
//! - 路径坐标只用于作图定位，可任意仿射缩放
//! - 标签统一以 crystal 坐标保存，查询时按活动表示返回
//!
//! ## 依赖关系
//! - 被 `calc/` 使用
//! - 使用 `models/lattice.rs`, `models/units.rs`

use crate::error::{EphError, Result};
use crate::models::lattice::{basis_transform, distances, reshape_points};
use crate::models::units::RecipBasis;

use ndarray::{Array1, Array2, ArrayView2, ArrayViewD};
use std::collections::BTreeMap;

/// 点/路径查找的容差设置
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    pub atol: f64,
    pub rtol: f64,
    /// 容差内无匹配时是否退回到最近点
    pub nearest: bool,
}

impl Default for Lookup {
    fn default() -> Self {
        Lookup {
            atol: 1e-8,
            rtol: 1e-5,
            nearest: true,
        }
    }
}

impl Lookup {
    /// 不允许退回最近点的精确查找
    pub fn exact() -> Self {
        Lookup {
            nearest: false,
            ..Lookup::default()
        }
    }
}

fn isclose(a: f64, b: f64, atol: f64, rtol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= atol + rtol * b.abs()
}

fn check_square(m: &ArrayView2<'_, f64>) -> Result<()> {
    if m.dim() != (3, 3) {
        return Err(EphError::ShapeError {
            shape: m.shape().to_vec(),
        });
    }
    Ok(())
}

/// 倒空间点数据库
#[derive(Debug, Clone)]
pub struct RecipPtDb {
    crystal: Array2<f64>,
    cartesian: Array2<f64>,
    basis: RecipBasis,
    path: Array1<f64>,
    path_unit: String,
    labels: BTreeMap<String, [f64; 3]>,
    lattice: Array2<f64>,
    recip_lattice: Array2<f64>,
}

impl RecipPtDb {
    /// 从某一种表示的点集构造，另一种由晶格变换导出
    ///
    /// 路径默认为 `0..N-1`，单位 `arbitrary`。
    pub fn from_points(
        points: ArrayViewD<'_, f64>,
        unit: &str,
        lattice: ArrayView2<'_, f64>,
        recip_lattice: ArrayView2<'_, f64>,
    ) -> Result<Self> {
        check_square(&lattice)?;
        check_square(&recip_lattice)?;

        let basis = RecipBasis::canonicalize(unit)?;
        let points = reshape_points(points)?;

        let (crystal, cartesian) = match basis {
            RecipBasis::Crystal => {
                let cart = basis_transform(points.view(), lattice, recip_lattice, true, false);
                (points, cart)
            }
            RecipBasis::Cartesian => {
                let cryst = basis_transform(points.view(), lattice, recip_lattice, false, false);
                (cryst, points)
            }
        };

        let n = crystal.ncols();
        Ok(RecipPtDb {
            crystal,
            cartesian,
            basis,
            path: Array1::range(0.0, n as f64, 1.0),
            path_unit: "arbitrary".to_string(),
            labels: BTreeMap::new(),
            lattice: lattice.to_owned(),
            recip_lattice: recip_lattice.to_owned(),
        })
    }

    /// 同时给出两种表示，检查它们在 `atol` 内一致
    pub fn from_both(
        crystal: ArrayViewD<'_, f64>,
        cartesian: ArrayViewD<'_, f64>,
        lattice: ArrayView2<'_, f64>,
        recip_lattice: ArrayView2<'_, f64>,
        atol: f64,
    ) -> Result<Self> {
        let mut db = RecipPtDb::from_points(crystal, "crystal", lattice, recip_lattice)?;
        let cartesian = reshape_points(cartesian)?;
        if cartesian.shape() != db.cartesian.shape() {
            return Err(EphError::ShapeError {
                shape: cartesian.shape().to_vec(),
            });
        }

        let worst = db
            .cartesian
            .iter()
            .zip(cartesian.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        if worst > atol {
            return Err(EphError::InvalidValue {
                key: "cartesian".to_string(),
                reason: format!(
                    "crystal and cartesian coordinates disagree by {:.3e} (atol {:.1e})",
                    worst, atol
                ),
            });
        }

        db.cartesian = cartesian;
        Ok(db)
    }

    /// 设置路径坐标及其单位
    pub fn with_path(mut self, path: Array1<f64>, path_unit: &str) -> Result<Self> {
        if path.len() != self.len() {
            return Err(EphError::InvalidValue {
                key: "path".to_string(),
                reason: format!("expected {} coordinates, got {}", self.len(), path.len()),
            });
        }
        self.path = path;
        self.path_unit = path_unit.to_string();
        Ok(self)
    }

    /// 设置初始标签（crystal 坐标）
    pub fn with_labels(mut self, labels: BTreeMap<String, [f64; 3]>) -> Self {
        self.labels = labels;
        self
    }

    pub fn len(&self) -> usize {
        self.crystal.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前活动表示
    pub fn units(&self) -> RecipBasis {
        self.basis
    }

    /// 切换活动表示（只改标志，不重新计算数据）
    pub fn set_units(&mut self, unit: &str) -> Result<()> {
        self.basis = RecipBasis::canonicalize(unit)?;
        Ok(())
    }

    /// 活动表示下的点集 (3×N)
    pub fn points(&self) -> ArrayView2<'_, f64> {
        match self.basis {
            RecipBasis::Crystal => self.crystal.view(),
            RecipBasis::Cartesian => self.cartesian.view(),
        }
    }

    pub fn crystal(&self) -> ArrayView2<'_, f64> {
        self.crystal.view()
    }

    pub fn cartesian(&self) -> ArrayView2<'_, f64> {
        self.cartesian.view()
    }

    pub fn path(&self) -> &Array1<f64> {
        &self.path
    }

    pub fn path_unit(&self) -> &str {
        &self.path_unit
    }

    pub fn labels(&self) -> &BTreeMap<String, [f64; 3]> {
        &self.labels
    }

    /// 将路径仿射映射到 `[min, max]`
    pub fn scale_path(&mut self, min: f64, max: f64) -> Result<()> {
        let lo = self.path.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.path.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(hi > lo) {
            return Err(EphError::DegeneratePath { value: lo });
        }

        let span = max - min;
        self.path.mapv_inplace(|p| (p - lo) / (hi - lo) * span + min);
        Ok(())
    }

    /// 活动表示下各点到 `point` 的距离
    pub fn distances(&self, point: [f64; 3]) -> Result<Array1<f64>> {
        let target = Array2::from_shape_fn((3, 1), |(i, _)| point[i]);
        distances(self.points(), target.view())
    }

    /// 查找与 `point` 重合的点索引
    ///
    /// 容差内无匹配时，`nearest` 为真则返回距离最小的所有点并打印诊断信息，
    /// 否则报 `PointNotFound`。
    pub fn where_point(&self, point: [f64; 3], lookup: Lookup) -> Result<Vec<usize>> {
        let d = self.distances(point)?;
        let target = format!("point {:?} ({})", point, self.basis);
        Self::match_indices(&d, 0.0, lookup, &target)
    }

    /// 点 → 路径坐标
    pub fn point_to_path(&self, point: [f64; 3], lookup: Lookup) -> Result<Vec<f64>> {
        let indices = self.where_point(point, lookup)?;
        Ok(indices.into_iter().map(|i| self.path[i]).collect())
    }

    /// 路径坐标 → 点 (3×M，活动表示)
    pub fn path_to_point(&self, path: f64, lookup: Lookup) -> Result<Array2<f64>> {
        let target = format!("path coordinate {}", path);
        let indices = Self::match_indices(&self.path, path, lookup, &target)?;
        Ok(self.points().select(ndarray::Axis(1), &indices))
    }

    fn match_indices(
        values: &Array1<f64>,
        target: f64,
        lookup: Lookup,
        what: &str,
    ) -> Result<Vec<usize>> {
        let hits: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| isclose(**v, target, lookup.atol, lookup.rtol))
            .map(|(i, _)| i)
            .collect();
        if !hits.is_empty() {
            return Ok(hits);
        }

        let deviations = values.mapv(|v| (v - target).abs());
        let closest = deviations.iter().copied().fold(f64::INFINITY, f64::min);
        if !lookup.nearest || !closest.is_finite() {
            return Err(EphError::PointNotFound {
                target: what.to_string(),
                closest,
            });
        }

        log::warn!(
            "No exact match for {}; using nearest at distance {:.6e}",
            what,
            closest
        );
        Ok(deviations
            .iter()
            .enumerate()
            .filter(|(_, d)| isclose(**d, closest, lookup.atol, lookup.rtol))
            .map(|(i, _)| i)
            .collect())
    }

    /// 添加标签（crystal 坐标），同名标签被覆盖
    pub fn add_labels(&mut self, labels: BTreeMap<String, [f64; 3]>) {
        self.labels.extend(labels);
    }

    /// 删除标签；任一标签不存在则报错且不做任何修改
    pub fn remove_labels(&mut self, names: &[&str]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.labels.contains_key(**n)) {
            return Err(EphError::LabelNotFound(missing.to_string()));
        }
        for name in names {
            self.labels.remove(*name);
        }
        Ok(())
    }

    /// 标签在活动表示下的坐标
    pub fn label_point(&self, name: &str) -> Result<[f64; 3]> {
        let crystal = self
            .labels
            .get(name)
            .ok_or_else(|| EphError::LabelNotFound(name.to_string()))?;
        match self.basis {
            RecipBasis::Crystal => Ok(*crystal),
            RecipBasis::Cartesian => {
                let p = Array2::from_shape_fn((3, 1), |(i, _)| crystal[i]);
                let cart = basis_transform(
                    p.view(),
                    self.lattice.view(),
                    self.recip_lattice.view(),
                    true,
                    false,
                );
                Ok([cart[[0, 0]], cart[[1, 0]], cart[[2, 0]]])
            }
        }
    }

    /// 所有落在路径上的标签及其路径坐标（按路径坐标排序）
    pub fn labels_on_path(&self, atol: f64) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        for (name, point) in &self.labels {
            let target = Array2::from_shape_fn((3, 1), |(i, _)| point[i]);
            let d = match distances(self.crystal.view(), target.view()) {
                Ok(d) => d,
                Err(_) => continue,
            };
            for (i, dist) in d.iter().enumerate() {
                if *dist <= atol {
                    out.push((name.clone(), self.path[i]));
                }
            }
        }
        out.sort_by(|a, b| a.1.total_cmp(&b.1));
        out
    }
}
