//! # export 命令实现
//!
//! 将 `bands` 或 `phdisp` 记录展开为长表格 CSV：
//! 每行一个 (点, 能带/模式) 组合，带路径坐标与三个点坐标。
//!
//! ## 依赖关系
//! - 使用 `cli/export.rs` 定义的参数
//! - 使用 `calc/` 读取记录
//! - 使用 `csv` 库写入 CSV 文件

use crate::calc::{self, CalcRecord};
use crate::cli::export::ExportArgs;
use crate::error::{EphError, Result};
use crate::models::quantity::QuantityMap;
use crate::models::recip::RecipPtDb;
use crate::models::units::UnitFamily;
use crate::utils::output;

use std::path::Path;

/// 执行 export 命令
pub fn execute(args: ExportArgs) -> Result<()> {
    output::print_header("Exporting Dispersion");

    let (mut points, mut values, column) = match calc::load_record(&args.input)? {
        CalcRecord::Bands(b) => (b.kpt, b.bands, "band"),
        CalcRecord::Phdisp(p) => (p.qpt, p.phdisp, "mode"),
        other => {
            return Err(EphError::InvalidCalcMode {
                expected: "bands or phdisp".to_string(),
                found: other.mode().to_string(),
            })
        }
    };

    points.set_units(&args.basis.to_string())?;
    if let Some(unit) = &args.energy_unit {
        values.convert_units(unit).map_err(|e| {
            output::print_info(&format!(
                "Available energy units: {}",
                UnitFamily::Energy.units().join(", ")
            ));
            e
        })?;
    }

    let rows = write_dispersion_csv(&points, &values, column, &args.output)?;
    output::print_success(&format!(
        "{} -> {} ({} rows, {} {}(s), {} points, energy in {})",
        args.input.display(),
        args.output.display(),
        rows,
        values.len(),
        column,
        points.len(),
        values.unit()
    ));
    Ok(())
}

/// 写入色散 CSV，返回数据行数
///
/// 列：`index,path,kx,ky,kz,<column>,energy_<unit>`，坐标取点集的活动表示。
pub fn write_dispersion_csv(
    points: &RecipPtDb,
    values: &QuantityMap,
    column: &str,
    output_path: &Path,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let energy_col = format!("energy_{}", values.unit());
    wtr.write_record(["index", "path", "kx", "ky", "kz", column, energy_col.as_str()])?;

    let coords = points.points();
    let path = points.path();
    let mut rows = 0;

    for (key, value) in values.iter() {
        let energies = value.as_array().ok_or_else(|| EphError::InvalidValue {
            key: format!("{} {}", column, key),
            reason: "expected one value per point".to_string(),
        })?;
        if energies.len() != points.len() {
            return Err(EphError::InvalidValue {
                key: format!("{} {}", column, key),
                reason: format!("{} values for {} points", energies.len(), points.len()),
            });
        }

        for (i, energy) in energies.iter().enumerate() {
            wtr.write_record(&[
                i.to_string(),
                format!("{:.6}", path[i]),
                format!("{:.8}", coords[[0, i]]),
                format!("{:.8}", coords[[1, i]]),
                format!("{:.8}", coords[[2, i]]),
                key.to_string(),
                format!("{:.8}", energy),
            ])?;
            rows += 1;
        }
    }

    wtr.flush().map_err(|e| EphError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(rows)
}
