//! # ephkit 命令行入口
//!
//! ## 子命令
//! - `compare`   - 按容差策略比较两个输出文件
//! - `testsuite` - 将参考目录与输出目录逐文件比较
//! - `export`    - 将能带/声子色散导出为 CSV
//! - `info`      - 显示计算记录摘要
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `warn`。

use clap::Parser;
use ephkit::cli::Cli;
use ephkit::{commands, utils};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
