//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `band`: 色散模型、能带边搜索与有效质量（支持目录批处理）
//! - `reorg`: 四点法重组能计算（驱动外部量子化学程序）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: band, reorg

pub mod band;
pub mod reorg;

use clap::{Parser, Subcommand};

/// oscreen - 有机半导体分子晶体筛选工具
#[derive(Parser)]
#[command(name = "oscreen")]
#[command(version)]
#[command(
    about = "Organic-semiconductor screening: HB band dispersion, effective masses and reorganization energies",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Band dispersion, band edge and effective masses from transfer-integral files
    Band(band::BandArgs),

    /// Four-point reorganization energies for cation and anion
    Reorg(reorg::ReorgArgs),
}
