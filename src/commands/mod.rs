//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `compare/`, `calc/`, `parsers/`, `batch/`, `utils/`
//! - 子模块: compare, testsuite, export, info

pub mod compare;
pub mod export;
pub mod info;
pub mod testsuite;

use crate::cli::Commands;
use crate::compare::TolerancePolicy;
use crate::error::Result;
use crate::utils::output;

use std::path::Path;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Compare(args) => compare::execute(args),
        Commands::Testsuite(args) => testsuite::execute(args),
        Commands::Export(args) => export::execute(args),
        Commands::Info(args) => info::execute(args),
    }
}

/// 读取容差策略；未指定时使用内置默认值
pub(crate) fn load_policy(path: Option<&Path>) -> Result<TolerancePolicy> {
    match path {
        Some(p) => {
            let policy = TolerancePolicy::from_file(p)?;
            output::print_info(&format!(
                "Policy '{}': default atol = {:e}, rtol = {:e}, {} key tolerance(s)",
                p.display(),
                policy.default_tolerance.atol,
                policy.default_tolerance.rtol,
                policy.tolerance.len()
            ));
            Ok(policy)
        }
        None => {
            let policy = TolerancePolicy::default();
            output::print_info(&format!(
                "Using built-in tolerances: atol = {:e}, rtol = {:e}",
                policy.default_tolerance.atol, policy.default_tolerance.rtol
            ));
            Ok(policy)
        }
    }
}
