//! # 重组能模块
//!
//! 四点法 (Nelsen) 计算阳离子和阴离子的重组能。
//!
//! ## 组成
//! - `engine`: 外部计算引擎抽象（本地子进程 / Slurm）
//! - `driver`: 七步依赖调度、输出检查、λ 组装
//! - `summary`: 汇总文件
//!
//! ## 依赖关系
//! - 被 `commands/reorg.rs` 使用
//! - 使用 `parsers/`, `models/reorg.rs`, `utils/slurm.rs`

pub mod driver;
pub mod engine;
pub mod summary;

pub use driver::{Functional, ReorgConfig, ReorgDriver, ReorgOutcome};
pub use engine::{Engine, LocalEngine, SlurmEngine};
