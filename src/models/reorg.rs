//! # 重组能数据模型
//!
//! 四点法 (Nelsen) 所需的电荷态、计算类型、能量记录和最终 λ。
//!
//! ## 电荷编码
//! - `0`  中性分子，中性几何
//! - `+0` 中性分子，阳离子优化几何
//! - `-0` 中性分子，阴离子优化几何
//! - `+1` / `-1` 阳离子 / 阴离子
//!
//! ## 依赖关系
//! - 被 `reorg/` 模块使用

use serde::{Deserialize, Serialize};

/// Hartree → eV
pub const HARTREE_TO_EV: f64 = 27.21138602;

/// Hartree → meV
pub const HARTREE_TO_MEV: f64 = 1000.0 * HARTREE_TO_EV;

/// 电荷态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Charge {
    Neutral,
    NeutralAtCation,
    NeutralAtAnion,
    Cation,
    Anion,
}

impl Charge {
    /// 计算引擎中的 (电荷, 自旋多重度)
    pub fn charge_spin(&self) -> (i32, u32) {
        match self {
            Charge::Neutral | Charge::NeutralAtCation | Charge::NeutralAtAnion => (0, 1),
            Charge::Cation => (1, 2),
            Charge::Anion => (-1, 2),
        }
    }

    /// 文件名标记
    pub fn file_tag(&self) -> &'static str {
        match self {
            Charge::Neutral => "0",
            Charge::NeutralAtCation => "p0",
            Charge::NeutralAtAnion => "m0",
            Charge::Cation => "p1",
            Charge::Anion => "m1",
        }
    }
}

impl std::fmt::Display for Charge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Charge::Neutral => write!(f, "0"),
            Charge::NeutralAtCation => write!(f, "+0"),
            Charge::NeutralAtAnion => write!(f, "-0"),
            Charge::Cation => write!(f, "+1"),
            Charge::Anion => write!(f, "-1"),
        }
    }
}

/// 计算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalcKind {
    /// 平衡几何：优化 + 频率
    Eg,
    /// 单点能
    Sp,
}

impl std::fmt::Display for CalcKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcKind::Eg => write!(f, "EG"),
            CalcKind::Sp => write!(f, "SP"),
        }
    }
}

/// 四点循环中的一步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// 序号 1..=7
    pub index: usize,
    pub charge: Charge,
    pub kind: CalcKind,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({} {})", self.index, self.charge, self.kind)
    }
}

/// 单步能量记录
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub step: Step,
    /// SCF 能量 (Hartree)
    pub energy: f64,
}

/// EG 步骤的振动频率 (cm⁻¹)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencySet {
    pub values: Vec<f64>,
}

impl FrequencySet {
    pub fn new(values: Vec<f64>) -> Self {
        FrequencySet { values }
    }

    /// 非正频率及其模式编号（从 1 开始）
    pub fn imaginary_modes(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, f)| **f <= 0.0)
            .map(|(i, f)| (i + 1, *f))
            .collect()
    }

    /// 最小频率
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

/// 四点法结果 (Hartree)
///
/// 每个分量在物理上都应非负。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReorgComponents {
    /// E(+0 SP @ 阳离子几何) − E(0 EG)
    pub cation_l1: f64,
    /// E(+1 SP @ 中性几何) − E(+1 EG)
    pub cation_l2: f64,
    /// E(-0 SP @ 阴离子几何) − E(0 EG)
    pub anion_l1: f64,
    /// E(-1 SP @ 中性几何) − E(-1 EG)
    pub anion_l2: f64,
}

impl ReorgComponents {
    /// 由七步能量 E1..E7 组装
    ///
    /// λ(cation) = (E6 − E1) + (E4 − E2) = (E4 − E1) + (E6 − E2)
    pub fn from_energies(e: &[f64; 7]) -> Self {
        ReorgComponents {
            cation_l1: e[3] - e[0],
            cation_l2: e[5] - e[1],
            anion_l1: e[4] - e[0],
            anion_l2: e[6] - e[2],
        }
    }

    pub fn cation_hartree(&self) -> f64 {
        self.cation_l1 + self.cation_l2
    }

    pub fn anion_hartree(&self) -> f64 {
        self.anion_l1 + self.anion_l2
    }

    pub fn cation_mev(&self) -> f64 {
        self.cation_hartree() * HARTREE_TO_MEV
    }

    pub fn anion_mev(&self) -> f64 {
        self.anion_hartree() * HARTREE_TO_MEV
    }

    /// 第一个为负的分量名称
    pub fn negative_component(&self) -> Option<&'static str> {
        [
            ("lambda1(cation)", self.cation_l1),
            ("lambda2(cation)", self.cation_l2),
            ("lambda1(anion)", self.anion_l1),
            ("lambda2(anion)", self.anion_l2),
        ]
        .into_iter()
        .find(|(_, v)| *v < 0.0)
        .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imaginary_modes() {
        let freqs = FrequencySet::new(vec![-12.3, 45.0, 78.0, -3.1]);
        assert_eq!(freqs.imaginary_modes(), vec![(1, -12.3), (4, -3.1)]);
        assert_eq!(freqs.min(), Some(-12.3));
        assert!(FrequencySet::default().min().is_none());
    }

    #[test]
    fn test_components_from_energies() {
        let e = [-100.0, -99.75, -100.05, -99.995, -99.99, -99.74, -100.04];
        let c = ReorgComponents::from_energies(&e);
        assert!((c.cation_hartree() - ((e[5] - e[0]) + (e[3] - e[1]))).abs() < 1e-12);
        assert!((c.anion_hartree() - ((e[6] - e[0]) + (e[4] - e[2]))).abs() < 1e-12);
        assert!((c.cation_hartree() - 0.015).abs() < 1e-9);
        assert!((c.anion_mev() - 0.02 * 27211.38602).abs() < 1e-6);
        assert_eq!(c.negative_component(), None);
    }

    #[test]
    fn test_charge_spin() {
        assert_eq!(Charge::Neutral.charge_spin(), (0, 1));
        assert_eq!(Charge::NeutralAtAnion.charge_spin(), (0, 1));
        assert_eq!(Charge::Cation.charge_spin(), (1, 2));
        assert_eq!(Charge::Anion.charge_spin(), (-1, 2));
    }
}
