//! # reorg 子命令 CLI 定义
//!
//! 四点法重组能循环，本地运行或提交到 Slurm
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/reorg.rs`

use clap::Args;
use std::path::PathBuf;

/// reorg 子命令参数
#[derive(Args, Debug)]
pub struct ReorgArgs {
    /// Material names; each needs <material>.gjf (or .com) in the work directory
    #[arg(required = true)]
    pub materials: Vec<String>,

    /// Functional and basis, e.g. 'b3lyp/6-31g(d)' or 'pbepbe/6-31g(d)+D3'
    #[arg(short, long, default_value = "b3lyp/6-31g(d)")]
    pub functional: String,

    /// Working directory holding source geometries and engine outputs
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Launch independent steps of a stage concurrently
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    // ─────────────────────────────────────────────────────────────
    // Engine options
    // ─────────────────────────────────────────────────────────────
    /// Engine executable
    #[arg(long, env = "OSCREEN_GAUSSIAN")]
    pub gaussian: Option<String>,

    /// Use the legacy engine executable (g09) when --gaussian is not given
    #[arg(long, default_value_t = false)]
    pub legacy: bool,

    /// Shared-memory processors written as %nprocshared
    #[arg(long, env = "OSCREEN_NPROC", default_value_t = 16)]
    pub nproc: u32,

    /// Memory written as %mem
    #[arg(long, env = "OSCREEN_MEM", default_value = "16GB")]
    pub mem: String,

    // ─────────────────────────────────────────────────────────────
    // Slurm options
    // ─────────────────────────────────────────────────────────────
    /// Submit each step through Slurm instead of running locally
    #[arg(long, default_value_t = false)]
    pub slurm: bool,

    /// Slurm partition
    #[arg(long, default_value = "cpu")]
    pub partition: String,

    /// Time limit (e.g., '48:00:00')
    #[arg(long, default_value = "48:00:00")]
    pub time: String,

    /// Number of tasks
    #[arg(long, default_value_t = 1)]
    pub ntasks: u32,

    /// Memory per CPU
    #[arg(long, default_value = "2G")]
    pub mem_per_cpu: String,

    /// Module list (comma-separated)
    #[arg(long, default_value = "")]
    pub modules: String,

    /// Initial queue polling interval in seconds
    #[arg(long, default_value_t = 30)]
    pub poll_interval: u64,

    /// Maximum queue polling interval in seconds
    #[arg(long, default_value_t = 300)]
    pub max_poll_interval: u64,
}
