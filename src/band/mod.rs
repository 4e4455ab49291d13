//! # 能带色散与有效质量模块
//!
//! 从 HB 晶格转移积分计算能带色散、能带边和载流子有效质量。
//!
//! ## 数据流
//! ```text
//! DispersionInput ─┬─> model ──> optimizer ──> effmass
//!                  ├─> surface (播种 optimizer)
//!                  └─> path ──> export / plot
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 使用
//! - 使用 `models/dispersion.rs`
//! - 子模块: model, surface, optimizer, effmass, path, export, plot

pub mod effmass;
pub mod export;
pub mod model;
pub mod optimizer;
pub mod path;
pub mod plot;
pub mod surface;

pub use optimizer::{BandEdgeOptimizer, DeConfig};

use crate::models::{DispersionInput, EdgeSearch, EffectiveMass};
use path::BandPath;
use surface::BandSurface;

/// 单个参数记录的完整分析结果
#[derive(Debug, Clone)]
pub struct BandAnalysis {
    pub input: DispersionInput,
    pub surface: BandSurface,
    pub path: BandPath,
    pub search: EdgeSearch,
    /// 优化器失败时为 None
    pub mass: Option<EffectiveMass>,
}

/// 执行完整的能带分析：采样、寻边、有效质量
pub fn analyze(input: DispersionInput, config: DeConfig) -> BandAnalysis {
    let surface = BandSurface::sample(&input);
    let path = path::sample_path(&input);
    let search = BandEdgeOptimizer::new(config).find_band_edge(&input, &surface);

    let mass = match search.failure {
        None => Some(effmass::effective_mass(&input, &search.edge)),
        Some(failure) => {
            log::warn!(
                "{}: band-edge search failed ({}), skipping effective mass",
                input.label,
                failure
            );
            None
        }
    };

    BandAnalysis {
        input,
        surface,
        path,
        search,
        mass,
    }
}
