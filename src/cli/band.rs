//! # band 子命令 CLI 定义
//!
//! 从转移积分参数文件计算能带色散与有效质量
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/band.rs`

use clap::Args;
use std::path::PathBuf;

/// band 子命令参数
#[derive(Args, Debug)]
pub struct BandArgs {
    /// Parameter file or directory of parameter files
    pub input: PathBuf,

    /// File name patterns when input is a directory (comma-separated)
    #[arg(short, long, default_value = "*HOMO*.txt,*LUMO*.txt,*homo*.txt,*lumo*.txt")]
    pub pattern: String,

    /// Search subdirectories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Output directory (defaults to the directory of each input file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    // ─────────────────────────────────────────────────────────────
    // Optimizer options
    // ─────────────────────────────────────────────────────────────
    /// Seed of the differential-evolution RNG
    #[arg(long, default_value_t = 20240601)]
    pub seed: u64,

    /// Population size (at least 30)
    #[arg(long, default_value_t = 30)]
    pub population: usize,

    /// Generation cap; reaching it marks the search as failed
    #[arg(long, default_value_t = 1000)]
    pub max_generations: usize,

    // ─────────────────────────────────────────────────────────────
    // Output control
    // ─────────────────────────────────────────────────────────────
    /// Skip PNG band-structure plots
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Recompute even if outputs already exist
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
