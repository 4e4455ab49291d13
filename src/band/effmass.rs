//! # 有效质量估计
//!
//! 在能带边处构造 2×2 曲率张量并对角化，得到主有效质量。
//!
//! ## 单位换算
//! ```text
//! m_i / mₑ = ℏ² / (mₑ · λ_i) · 10²⁰
//! ℏ  = 6.582119569e-13 meV·s
//! mₑ = 0.51099895e9 meV / c²
//! ```
//! λ_i 单位为 meV·Å²，10²⁰ 将 m² 换算为 Å²。
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `band/model.rs` 计算 Hessian
//! - 使用 `nalgebra` 对称矩阵特征分解

use crate::band::model::HbModel;
use crate::models::{BandEdge, DispersionInput, EffectiveMass, MassProvenance, MassTensor};

use nalgebra::Matrix2;

/// 约化普朗克常数 (meV·s)
pub const HBAR_MEV_S: f64 = 6.582119569e-13;
/// 电子静止能量 (meV)
pub const ELECTRON_REST_ENERGY_MEV: f64 = 0.51099895e9;
/// 光速 (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// m² → Å²
const M2_TO_A2: f64 = 1e20;

/// 小于该值的特征值视为奇异 (meV·Å²)
const SINGULAR_EIGENVALUE: f64 = 1e-12;

/// ℏ²/mₑ (meV·Å²)，约 7619.96
pub fn hbar2_over_me() -> f64 {
    let me = ELECTRON_REST_ENERGY_MEV / (SPEED_OF_LIGHT * SPEED_OF_LIGHT);
    HBAR_MEV_S * HBAR_MEV_S / me * M2_TO_A2
}

/// 由曲率得到有效质量（以 mₑ 为单位）
pub fn curvature_to_mass(curvature: f64) -> f64 {
    hbar2_over_me() / curvature
}

/// 计算能带边处的主有效质量
pub fn effective_mass(input: &DispersionInput, edge: &BandEdge) -> EffectiveMass {
    let tensor: MassTensor = HbModel::from_input(input)
        .band_curvature(input.kind, edge.kc, edge.kt)
        .into();
    masses_from_tensor(tensor)
}

/// 对角化曲率张量；失败时退回对角元
pub fn masses_from_tensor(tensor: MassTensor) -> EffectiveMass {
    let matrix = Matrix2::new(tensor.cc, tensor.ct, tensor.ct, tensor.tt);

    let decomposition = matrix.try_symmetric_eigen(1e-14, 100).filter(|eig| {
        eig.eigenvalues
            .iter()
            .all(|l| l.is_finite() && l.abs() >= SINGULAR_EIGENVALUE)
    });

    match decomposition {
        Some(eig) => {
            let mut pairs: Vec<(f64, [f64; 2])> = (0..2)
                .map(|i| {
                    let v = eig.eigenvectors.column(i);
                    (curvature_to_mass(eig.eigenvalues[i]), [v[0], v[1]])
                })
                .collect();
            // m₁ 为较轻的质量
            pairs.sort_by(|a, b| a.0.abs().total_cmp(&b.0.abs()));

            let axis = pairs[0].1;
            EffectiveMass {
                m1: pairs[0].0,
                m2: pairs[1].0,
                axis_angle: Some(axis_angle(axis)),
                provenance: MassProvenance::Tensor,
                tensor,
            }
        }
        None => {
            log::debug!(
                "mass tensor [{:.6e}, {:.6e}; {:.6e}] is singular, using diagonal",
                tensor.cc,
                tensor.ct,
                tensor.tt
            );
            EffectiveMass {
                m1: curvature_to_mass(tensor.cc),
                m2: curvature_to_mass(tensor.tt),
                axis_angle: None,
                provenance: MassProvenance::DiagonalFallback,
                tensor,
            }
        }
    }
}

/// 主轴相对 kc 轴的夹角，归一化到 (−90°, 90°]
fn axis_angle(v: [f64; 2]) -> f64 {
    let mut angle = v[1].atan2(v[0]).to_degrees();
    if angle > 90.0 {
        angle -= 180.0;
    } else if angle <= -90.0 {
        angle += 180.0;
    }
    angle
}
