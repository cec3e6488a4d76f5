//! # 数据模型模块
//!
//! 定义单位注册表、晶格变换、带单位物理量容器与倒空间点数据库。
//!
//! ## 依赖关系
//! - 被 `calc/` 和 `commands/` 使用
//! - 子模块: units, lattice, quantity, recip

pub mod lattice;
pub mod quantity;
pub mod recip;
pub mod units;

pub use lattice::{basis_transform, distances, points_from_rows, reshape_points};
pub use quantity::{QuantityKey, QuantityMap, QuantityValue};
pub use recip::{Lookup, RecipPtDb};
pub use units::{RecipBasis, UnitFamily};
