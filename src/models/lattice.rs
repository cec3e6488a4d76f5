//! # 晶格坐标变换
//!
//! 3 维向量的形状规范化与 crystal ↔ cartesian 坐标基变换。
//! 所有点集统一存储为列向量排列的 3×N 矩阵。
//!
//! 四种变换矩阵的选取：
//!
//! | 空间 | forward | backward |
//! |------|---------|----------|
//! | 实空间 | `lattice` | `recip_lattice^T` |
//! | 倒空间 | `recip_lattice` | `lattice^T` |
//!
//! 其中 `lattice` 与 `recip_lattice` 的列分别为实空间与倒空间基矢，
//! 满足 `lattice^T · recip_lattice = I`（alat 与 2π/alat 单位下）。
//!
//! ## 依赖关系
//! - 被 `models/recip.rs`, `calc/header.rs` 使用
//! - 使用 `ndarray`

use crate::error::{EphError, Result};
use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, Axis, Ix1, Ix2};

/// 规范化点集形状为 3×N（列向量）
///
/// 接受单个 3 维向量、N×3 或 3×N 数组。3×3 输入视为已经是列排列。
pub fn reshape_points(points: ArrayViewD<'_, f64>) -> Result<Array2<f64>> {
    let shape = points.shape().to_vec();
    match points.ndim() {
        1 if shape[0] == 3 => {
            let v = points
                .into_dimensionality::<Ix1>()
                .map_err(|_| EphError::ShapeError { shape: shape.clone() })?;
            Ok(v.to_owned().insert_axis(Axis(1)))
        }
        2 => {
            let m = points
                .into_dimensionality::<Ix2>()
                .map_err(|_| EphError::ShapeError { shape: shape.clone() })?;
            if shape[0] == 3 {
                Ok(m.to_owned())
            } else if shape[1] == 3 {
                Ok(m.t().to_owned())
            } else {
                Err(EphError::ShapeError { shape })
            }
        }
        _ => Err(EphError::ShapeError { shape }),
    }
}

/// 从行向量列表构造 3×N 矩阵
pub fn points_from_rows(rows: &[[f64; 3]]) -> Array2<f64> {
    let mut out = Array2::zeros((3, rows.len()));
    for (j, row) in rows.iter().enumerate() {
        for i in 0..3 {
            out[[i, j]] = row[i];
        }
    }
    out
}

/// 坐标基变换 `points' = M · points`
///
/// - `forward = true`: 分数坐标 → 笛卡尔坐标
/// - `real_space = false`: 倒空间点（k/q 点）
pub fn basis_transform(
    points: ArrayView2<'_, f64>,
    lattice: ArrayView2<'_, f64>,
    recip_lattice: ArrayView2<'_, f64>,
    forward: bool,
    real_space: bool,
) -> Array2<f64> {
    match (real_space, forward) {
        (true, true) => lattice.dot(&points),
        (false, true) => recip_lattice.dot(&points),
        (true, false) => recip_lattice.t().dot(&points),
        (false, false) => lattice.t().dot(&points),
    }
}

/// 逐列欧氏距离
///
/// 任一侧只有一列时广播到另一侧的所有列；任一侧为空时返回空数组。
pub fn distances(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    let (na, nb) = (a.ncols(), b.ncols());
    if a.nrows() != 3 || b.nrows() != 3 || (na != nb && na != 1 && nb != 1) {
        return Err(EphError::ShapeError {
            shape: vec![a.nrows(), na, b.nrows(), nb],
        });
    }

    if na == 0 || nb == 0 {
        return Ok(Array1::zeros(0));
    }

    let n = na.max(nb);
    let mut out = Array1::zeros(n);
    for j in 0..n {
        let ja = if na == 1 { 0 } else { j };
        let jb = if nb == 1 { 0 } else { j };
        let sq: f64 = (0..3).map(|i| (a[[i, ja]] - b[[i, jb]]).powi(2)).sum();
        out[j] = sq.sqrt();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array2};

    /// FCC 晶格（alat 单位），列为基矢
    fn fcc() -> (Array2<f64>, Array2<f64>) {
        let lattice = arr2(&[[0.5, 0.5, 0.0], [0.0, 0.5, 0.5], [0.5, 0.0, 0.5]])
            .t()
            .to_owned();
        let recip = arr2(&[[1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, -1.0, 1.0]])
            .t()
            .to_owned();
        (lattice, recip)
    }

    #[test]
    fn test_reshape_single_vector() {
        let v = arr1(&[0.1, 0.2, 0.3]);
        let p = reshape_points(v.view().into_dyn()).unwrap();
        assert_eq!(p.shape(), &[3, 1]);
        assert_eq!(p[[2, 0]], 0.3);
    }

    #[test]
    fn test_reshape_row_major() {
        let m = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0], [0.0, 0.0, 1.0]]);
        let p = reshape_points(m.view().into_dyn()).unwrap();
        assert_eq!(p.shape(), &[3, 4]);
        assert_eq!(p[[0, 1]], 4.0);
        assert_eq!(p[[2, 3]], 1.0);
    }

    #[test]
    fn test_reshape_square_is_column_oriented() {
        let m = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let p = reshape_points(m.view().into_dyn()).unwrap();
        assert_eq!(p, m);
    }

    #[test]
    fn test_reshape_bad_shape() {
        let m = Array2::<f64>::zeros((2, 4));
        let err = reshape_points(m.view().into_dyn()).unwrap_err();
        assert!(matches!(err, EphError::ShapeError { .. }));

        let v = arr1(&[1.0, 2.0]);
        assert!(reshape_points(v.view().into_dyn()).is_err());
    }

    #[test]
    fn test_crystal_to_cartesian_fcc() {
        let (lattice, recip) = fcc();
        let crystal = points_from_rows(&[[0.5, 0.5, 0.5], [0.5, 0.5, 0.0], [0.75, 0.5, 0.25]]);
        let cart = basis_transform(crystal.view(), lattice.view(), recip.view(), true, false);

        let expected = points_from_rows(&[[0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.5, 1.0, 0.0]]);
        for (a, b) in cart.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_basis_round_trip() {
        let (lattice, recip) = fcc();
        let p = points_from_rows(&[[0.1, -0.3, 0.7], [1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]);
        for real_space in [true, false] {
            let fwd = basis_transform(p.view(), lattice.view(), recip.view(), true, real_space);
            let back = basis_transform(fwd.view(), lattice.view(), recip.view(), false, real_space);
            for (a, b) in back.iter().zip(p.iter()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_distances_broadcast() {
        let a = points_from_rows(&[[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]]);
        let b = points_from_rows(&[[0.0, 0.0, 0.0]]);
        let d = distances(a.view(), b.view()).unwrap();
        assert_eq!(d.len(), 2);
        assert!((d[1] - 5.0).abs() < 1e-12);

        let d = distances(b.view(), a.view()).unwrap();
        assert!((d[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distances_empty_side() {
        let empty = Array2::<f64>::zeros((3, 0));
        let one = points_from_rows(&[[0.0; 3]]);
        assert_eq!(distances(empty.view(), one.view()).unwrap().len(), 0);
        assert_eq!(distances(one.view(), empty.view()).unwrap().len(), 0);
    }

    #[test]
    fn test_distances_mismatched_columns() {
        let a = points_from_rows(&[[0.0; 3], [1.0; 3]]);
        let b = points_from_rows(&[[0.0; 3], [1.0; 3], [2.0; 3]]);
        assert!(distances(a.view(), b.view()).is_err());
    }
}
