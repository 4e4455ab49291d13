//! # 能带色散数据模型
//!
//! 存储人字形 (HB) 二维晶格的转移积分参数、能带边和有效质量结果。
//!
//! ## 单位约定
//! - 晶格间距 a, b：Å
//! - 转移积分 Tij、能量：meV
//! - 波矢 kc, kt：Å⁻¹
//! - 有效质量：自由电子质量 mₑ
//!
//! ## 依赖关系
//! - 被 `parsers/ti_param.rs` 创建
//! - 被 `band/` 各模块使用

use serde::{Deserialize, Serialize};

/// 追踪的能带类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandKind {
    /// 空穴传输：E+ 的极大值
    Homo,
    /// 电子传输：E− 的极小值
    Lumo,
}

impl BandKind {
    /// 从标签中识别 HOMO/LUMO（不区分大小写，必须恰好出现一种）
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.to_uppercase();
        match (upper.contains("HOMO"), upper.contains("LUMO")) {
            (true, false) => Some(BandKind::Homo),
            (false, true) => Some(BandKind::Lumo),
            _ => None,
        }
    }
}

impl std::fmt::Display for BandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BandKind::Homo => write!(f, "HOMO"),
            BandKind::Lumo => write!(f, "LUMO"),
        }
    }
}

/// HB 基元中的五个转移积分 (meV)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferIntegrals {
    pub t12: f64,
    pub t13: f64,
    pub t23: f64,
    pub t34: f64,
    pub t35: f64,
}

impl TransferIntegrals {
    /// 五个积分取相同值
    pub fn uniform(t: f64) -> Self {
        TransferIntegrals {
            t12: t,
            t13: t,
            t23: t,
            t34: t,
            t35: t,
        }
    }
}

/// 色散参数记录（只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispersionInput {
    /// 材料标签，包含 HOMO 或 LUMO
    pub label: String,
    /// 能带类型（由标签推断）
    pub kind: BandKind,
    /// 路径离散点数 (n ≥ 1)
    pub n: usize,
    /// 列方向间距 a (Å)
    pub a: f64,
    /// 横向间距 b (Å)
    pub b: f64,
    /// 转移积分
    pub t: TransferIntegrals,
}

impl DispersionInput {
    /// 布里渊区边界 (π/a, π/b)
    pub fn zone_edge(&self) -> (f64, f64) {
        (std::f64::consts::PI / self.a, std::f64::consts::PI / self.b)
    }
}

/// 能带边
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEdge {
    pub kc: f64,
    pub kt: f64,
    /// 能带边能量 (meV)
    pub energy: f64,
}

/// 能带边搜索失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFailure {
    /// 达到代数上限仍未收敛
    GenerationCap { generations: usize },
    /// 出现非有限的能量或坐标
    NonFinite,
}

impl std::fmt::Display for EdgeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeFailure::GenerationCap { generations } => {
                write!(f, "no convergence within {} generations", generations)
            }
            EdgeFailure::NonFinite => write!(f, "non-finite band energy encountered"),
        }
    }
}

/// 优化器输出：能带边及失败原因
#[derive(Debug, Clone, Copy)]
pub struct EdgeSearch {
    pub edge: BandEdge,
    /// 成功时为 None
    pub failure: Option<EdgeFailure>,
    pub generations: usize,
    pub evaluations: usize,
}

impl EdgeSearch {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// 有效质量来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassProvenance {
    /// 完整 2×2 张量对角化
    Tensor,
    /// 对角化失败，退回到对角元
    DiagonalFallback,
}

impl std::fmt::Display for MassProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MassProvenance::Tensor => write!(f, "tensor"),
            MassProvenance::DiagonalFallback => write!(f, "diagonal-fallback"),
        }
    }
}

/// 能带边处的曲率张量 (meV·Å²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassTensor {
    pub cc: f64,
    pub tt: f64,
    pub ct: f64,
}

/// 主有效质量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveMass {
    pub m1: f64,
    pub m2: f64,
    /// m₁ 主轴相对 kc 轴的夹角（度），仅张量对角化时有效
    pub axis_angle: Option<f64>,
    pub provenance: MassProvenance,
    pub tensor: MassTensor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_kind_from_label() {
        assert_eq!(BandKind::from_label("pentacene_HOMO"), Some(BandKind::Homo));
        assert_eq!(BandKind::from_label("rubrene-lumo"), Some(BandKind::Lumo));
        assert_eq!(BandKind::from_label("tips_Homo_v2"), Some(BandKind::Homo));
        assert_eq!(BandKind::from_label("anthracene"), None);
        assert_eq!(BandKind::from_label("HOMO_LUMO"), None);
    }
}
