//! # info 命令实现
//!
//! 识别记录的计算模式并以表格形式显示摘要。
//!
//! ## 依赖关系
//! - 使用 `cli/info.rs` 定义的参数
//! - 使用 `calc/` 读取记录
//! - 使用 `tabled` 显示表格

use crate::calc::{self, CalcRecord};
use crate::cli::info::InfoArgs;
use crate::error::Result;
use crate::models::quantity::QuantityMap;
use crate::models::recip::RecipPtDb;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 摘要表格行
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct InfoRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl InfoRow {
    fn new(property: &str, value: impl ToString) -> Self {
        InfoRow {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

/// 执行 info 命令
pub fn execute(args: InfoArgs) -> Result<()> {
    output::print_header(&format!("Record: {}", args.input.display()));

    let record = calc::load_record(&args.input)?;
    let rows = summary_rows(&record, args.energy_unit.as_deref())?;
    println!("{}", Table::new(&rows));

    Ok(())
}

/// 生成记录摘要；`energy_unit` 给定时能量相关数值换算到该单位
pub fn summary_rows(record: &CalcRecord, energy_unit: Option<&str>) -> Result<Vec<InfoRow>> {
    let header = record.header();
    let mut rows = vec![
        InfoRow::new("Calculation mode", record.mode()),
        InfoRow::new("alat", format!("{} {}", header.alat, header.alat_units)),
        InfoRow::new("Atoms in unit cell", header.num_atoms),
    ];

    match record {
        CalcRecord::Bands(b) => {
            rows.push(InfoRow::new("k-points", b.kpt.len()));
            rows.extend(labels_row(&b.kpt));
            rows.push(InfoRow::new("Bands", b.num_bands()));
            rows.push(energy_row("Energy range", &b.bands, energy_unit)?);
        }
        CalcRecord::Phdisp(p) => {
            rows.push(InfoRow::new("q-points", p.qpt.len()));
            rows.extend(labels_row(&p.qpt));
            rows.push(InfoRow::new("Phonon modes", p.num_modes()));
            rows.push(energy_row("Phonon energy range", &p.phdisp, energy_unit)?);
        }
        CalcRecord::Ephmat(e) => {
            let k = e.kpoint;
            rows.push(InfoRow::new(
                "k-point (crystal)",
                format!("[{:.6}, {:.6}, {:.6}]", k[0], k[1], k[2]),
            ));
            rows.push(InfoRow::new("q-points", e.qpt.len()));
            rows.push(InfoRow::new("Phonon modes", e.num_modes()));
            rows.push(energy_row("Phonon energy range", &e.phonon_energies, energy_unit)?);
            if let Some(max) = e.max_defpot() {
                rows.push(InfoRow::new(
                    "Max |deformation potential|",
                    format!("{:.6} {}", max, e.defpot_units),
                ));
            }
        }
        CalcRecord::Imsigma(s) => {
            rows.push(InfoRow::new("k-points", s.kpt.len()));
            rows.push(InfoRow::new("Bands", s.num_bands()));
            rows.push(InfoRow::new("Configurations", s.num_configurations()));
            rows.push(temperatures_row(s.temperatures.values(), &s.temperature_units));
            rows.push(energy_row("Energy range", &s.energies, energy_unit)?);
            let imsigma = match energy_unit {
                Some(unit) => s.imsigma.to_units(unit)?,
                None => s.imsigma.clone(),
            };
            if let Some(max) = imsigma.max_abs() {
                rows.push(InfoRow::new(
                    "Max |Im Sigma|",
                    format!("{:.6} {}", max, imsigma.unit()),
                ));
            }
        }
        CalcRecord::Trans(t) => {
            rows.push(InfoRow::new("Configurations", t.num_configurations()));
            rows.push(temperatures_row(t.temperatures.values(), &t.temperature_units));
            rows.push(energy_row("Chemical potential range", &t.chemical_potentials, energy_unit)?);
            let sigma: Vec<String> = t
                .average_conductivity()
                .values()
                .map(|x| format!("{:.4e}", x))
                .collect();
            rows.push(InfoRow::new(
                "Mean conductivity",
                format!("{} {}", sigma.join(", "), t.conductivity_units),
            ));
        }
        CalcRecord::Dynamics(d) => {
            rows.push(InfoRow::new(
                "Time step",
                format!("{} {}", d.time_step, d.time_units),
            ));
            rows.push(InfoRow::new("Snapshots", d.num_snapshots));
            rows.push(InfoRow::new("Snapshot file", d.hdf5_file.display()));
        }
    }

    Ok(rows)
}

fn temperatures_row<'a>(temps: impl Iterator<Item = &'a f64>, units: &str) -> InfoRow {
    let temps: Vec<String> = temps.map(|t| format!("{}", t)).collect();
    InfoRow::new("Temperatures", format!("{} {}", temps.join(", "), units))
}

/// 路径上的高对称点，如 `G (0.000), X (1.000)`
fn labels_row(points: &RecipPtDb) -> Option<InfoRow> {
    let ticks = points.labels_on_path(1e-6);
    if ticks.is_empty() {
        return None;
    }
    let text: Vec<String> = ticks
        .iter()
        .map(|(name, path)| format!("{} ({:.3})", name, path))
        .collect();
    Some(InfoRow::new("Labels on path", text.join(", ")))
}

fn energy_row(property: &str, values: &QuantityMap, unit: Option<&str>) -> Result<InfoRow> {
    let values = match unit {
        Some(u) => values.to_units(u)?,
        None => values.clone(),
    };
    let value = match calc::bands::min_max(&values) {
        Some((lo, hi)) => format!("{:.4} .. {:.4} {}", lo, hi, values.unit()),
        None => "-".to_string(),
    };
    Ok(InfoRow::new(property, value))
}
