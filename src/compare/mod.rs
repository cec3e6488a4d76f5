//! # 结构比较模块
//!
//! 测试框架用来校验模拟器输出与参考文件是否一致。
//! 两类失败严格区分：
//! - 结构性不匹配（类型、键集合、长度、形状、不支持的类型）→ `Err(StructuralError)`
//! - 数值或字符串差异 → 累积为 `DiffRecord`，报告所有失败叶子
//!
//! ## 依赖关系
//! - 被 `commands/compare.rs`, `commands/testsuite.rs`, `batch/` 使用
//! - 子模块: tree, policy, diff, engine, error

pub mod diff;
pub mod engine;
pub mod error;
pub mod policy;
pub mod tree;

pub use diff::{Comparison, DiffRecord};
pub use engine::{compare, Comparator};
pub use error::{display_path, StructuralError};
pub use policy::{Tolerance, TolerancePolicy};
pub use tree::DataNode;
