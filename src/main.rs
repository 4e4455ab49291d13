//! # oscreen - 有机半导体分子晶体筛选工具
//!
//! 将 HB 堆积有机晶体的载流子输运筛选流程统一成单一可执行文件。
//!
//! ## 子命令
//! - `band`  - 由转移积分计算 HB 双能带色散、能带边与有效质量
//! - `reorg` - 驱动外部量子化学程序完成四点法重组能循环
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── band/      (色散模型、优化器、有效质量、路径采样)
//!   │     ├── reorg/     (引擎抽象、四点驱动器、汇总)
//!   │     ├── batch/     (文件收集与并行执行)
//!   │     ├── parsers/   (参数文件、gjf、引擎日志)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出、进度条、Slurm)
//!   └── error.rs    (错误处理)
//! ```

mod band;
mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod reorg;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    // RUST_LOG takes precedence over --debug
    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .init();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
