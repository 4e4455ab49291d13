//! # 数据模型模块
//!
//! 定义色散参数、能带边、有效质量、分子几何和重组能记录。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`band/`、`reorg/` 和 `commands/` 使用
//! - 子模块: dispersion, molecule, reorg

pub mod dispersion;
pub mod molecule;
pub mod reorg;

pub use dispersion::{
    BandEdge, BandKind, DispersionInput, EdgeFailure, EdgeSearch, EffectiveMass, MassProvenance,
    MassTensor, TransferIntegrals,
};
pub use molecule::{Atom, Molecule};
pub use reorg::{
    CalcKind, Charge, EnergyRecord, FrequencySet, ReorgComponents, Step, HARTREE_TO_MEV,
};
