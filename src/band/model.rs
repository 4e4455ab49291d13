//! # HB 两带紧束缚色散模型
//!
//! 闭式计算 E±(k) 及其对 (kc, kt) 的一阶、二阶偏导。
//!
//! ## 公式
//! ```text
//! B11   = 2·T12·cos(kc·a)
//! BR    = (T13+T35)·cos(kc·a/2 + kt·b/2) + (T23+T34)·cos(kc·a/2 − kt·b/2)
//! BI    = (T35−T13)·sin(kc·a/2 + kt·b/2) + (T23−T34)·sin(kc·a/2 − kt·b/2)
//! |B12| = √(BR² + BI²)
//! E±    = B11 ± |B12|
//! ```
//! B11 使用整个 a，B12 项使用 a/2、b/2：分子 1–5 位于半晶格偏移处。
//!
//! |B12| < 1e-20 时钳制为 1e-20，仅在能带简并点出现。
//!
//! ## 依赖关系
//! - 被 `band/surface.rs`, `band/optimizer.rs`, `band/effmass.rs`, `band/path.rs` 使用
//! - 使用 `models/dispersion.rs`
//! - 纯函数，无共享状态，可并行调用

use crate::models::{BandKind, DispersionInput, MassTensor, TransferIntegrals};

/// |B12| 的下限
pub const B12_FLOOR: f64 = 1e-20;

/// 单个能带在某 k 点的二阶偏导 (meV·Å²)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Curvature {
    pub cc: f64,
    pub tt: f64,
    pub ct: f64,
}

impl From<Curvature> for MassTensor {
    fn from(c: Curvature) -> Self {
        MassTensor {
            cc: c.cc,
            tt: c.tt,
            ct: c.ct,
        }
    }
}

/// 色散模型在某 k 点的完整输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionPoint {
    pub e_plus: f64,
    pub e_minus: f64,
    pub plus: Curvature,
    pub minus: Curvature,
}

/// HB 两带模型
#[derive(Debug, Clone, Copy)]
pub struct HbModel {
    pub a: f64,
    pub b: f64,
    pub t: TransferIntegrals,
}

/// B12 的中间量（值、梯度、Hessian）
struct B12Terms {
    modulus: f64,
    grad: [f64; 2],
    hess: [[f64; 2]; 2],
}

impl HbModel {
    pub fn new(a: f64, b: f64, t: TransferIntegrals) -> Self {
        HbModel { a, b, t }
    }

    pub fn from_input(input: &DispersionInput) -> Self {
        HbModel::new(input.a, input.b, input.t)
    }

    /// (E+, E−)
    pub fn energies(&self, kc: f64, kt: f64) -> (f64, f64) {
        let b11 = 2.0 * self.t.t12 * (kc * self.a).cos();
        let (br, bi) = self.b12_parts(kc, kt);
        let modulus = (br * br + bi * bi).sqrt().max(B12_FLOOR);
        (b11 + modulus, b11 - modulus)
    }

    /// 指定能带的能量
    pub fn band_energy(&self, kind: BandKind, kc: f64, kt: f64) -> f64 {
        let (e_plus, e_minus) = self.energies(kc, kt);
        match kind {
            BandKind::Homo => e_plus,
            BandKind::Lumo => e_minus,
        }
    }

    /// 能量与二阶偏导（八个量）
    pub fn evaluate(&self, kc: f64, kt: f64) -> DispersionPoint {
        let b11 = 2.0 * self.t.t12 * (kc * self.a).cos();
        let b11_cc = -2.0 * self.t.t12 * self.a * self.a * (kc * self.a).cos();
        let terms = self.b12_terms(kc, kt);

        DispersionPoint {
            e_plus: b11 + terms.modulus,
            e_minus: b11 - terms.modulus,
            plus: Curvature {
                cc: b11_cc + terms.hess[0][0],
                tt: terms.hess[1][1],
                ct: terms.hess[0][1],
            },
            minus: Curvature {
                cc: b11_cc - terms.hess[0][0],
                tt: -terms.hess[1][1],
                ct: -terms.hess[0][1],
            },
        }
    }

    /// 指定能带的 Hessian
    pub fn band_curvature(&self, kind: BandKind, kc: f64, kt: f64) -> Curvature {
        let point = self.evaluate(kc, kt);
        match kind {
            BandKind::Homo => point.plus,
            BandKind::Lumo => point.minus,
        }
    }

    /// 指定能带的梯度 [∂E/∂kc, ∂E/∂kt]
    pub fn band_gradient(&self, kind: BandKind, kc: f64, kt: f64) -> [f64; 2] {
        let b11_c = -2.0 * self.t.t12 * self.a * (kc * self.a).sin();
        let terms = self.b12_terms(kc, kt);
        let sign = match kind {
            BandKind::Homo => 1.0,
            BandKind::Lumo => -1.0,
        };
        [b11_c + sign * terms.grad[0], sign * terms.grad[1]]
    }

    /// 相位 p = kc·a/2 + kt·b/2, q = kc·a/2 − kt·b/2 及其对 (kc, kt) 的导数
    fn phases(&self, kc: f64, kt: f64) -> (f64, f64, [f64; 2], [f64; 2]) {
        let half_a = 0.5 * self.a;
        let half_b = 0.5 * self.b;
        (
            kc * half_a + kt * half_b,
            kc * half_a - kt * half_b,
            [half_a, half_b],
            [half_a, -half_b],
        )
    }

    fn b12_parts(&self, kc: f64, kt: f64) -> (f64, f64) {
        let t = &self.t;
        let (p, q, _, _) = self.phases(kc, kt);
        let br = (t.t13 + t.t35) * p.cos() + (t.t23 + t.t34) * q.cos();
        let bi = (t.t35 - t.t13) * p.sin() + (t.t23 - t.t34) * q.sin();
        (br, bi)
    }

    fn b12_terms(&self, kc: f64, kt: f64) -> B12Terms {
        let t = &self.t;
        let (p, q, dp, dq) = self.phases(kc, kt);
        let (sp, cp) = p.sin_cos();
        let (sq, cq) = q.sin_cos();

        let s1 = t.t13 + t.t35;
        let s2 = t.t23 + t.t34;
        let d1 = t.t35 - t.t13;
        let d2 = t.t23 - t.t34;

        let br = s1 * cp + s2 * cq;
        let bi = d1 * sp + d2 * sq;

        let mut br_1 = [0.0; 2];
        let mut bi_1 = [0.0; 2];
        let mut br_2 = [[0.0; 2]; 2];
        let mut bi_2 = [[0.0; 2]; 2];

        for x in 0..2 {
            br_1[x] = -s1 * sp * dp[x] - s2 * sq * dq[x];
            bi_1[x] = d1 * cp * dp[x] + d2 * cq * dq[x];
            for y in 0..2 {
                br_2[x][y] = -s1 * cp * dp[x] * dp[y] - s2 * cq * dq[x] * dq[y];
                bi_2[x][y] = -d1 * sp * dp[x] * dp[y] - d2 * sq * dq[x] * dq[y];
            }
        }

        let modulus = (br * br + bi * bi).sqrt().max(B12_FLOOR);
        let cube = modulus * modulus * modulus;

        // ∂|B12| = (BR·∂BR + BI·∂BI)/|B12|
        let proj = [
            br * br_1[0] + bi * bi_1[0],
            br * br_1[1] + bi * bi_1[1],
        ];
        let grad = [proj[0] / modulus, proj[1] / modulus];

        let mut hess = [[0.0; 2]; 2];
        for x in 0..2 {
            for y in 0..2 {
                let numerator = br_1[x] * br_1[y] + br * br_2[x][y] + bi_1[x] * bi_1[y]
                    + bi * bi_2[x][y];
                hess[x][y] = numerator / modulus - proj[x] * proj[y] / cube;
            }
        }

        B12Terms {
            modulus,
            grad,
            hess,
        }
    }
}

/// 按原始接口返回八个量：
/// (E+, E−, ∂²E+/∂kc², ∂²E+/∂kt², ∂²E+/∂kc∂kt, ∂²E−/∂kc², ∂²E−/∂kt², ∂²E−/∂kc∂kt)
pub fn dispersion(
    a: f64,
    b: f64,
    t: &TransferIntegrals,
    kc: f64,
    kt: f64,
) -> (f64, f64, f64, f64, f64, f64, f64, f64) {
    let p = HbModel::new(a, b, *t).evaluate(kc, kt);
    (
        p.e_plus, p.e_minus, p.plus.cc, p.plus.tt, p.plus.ct, p.minus.cc, p.minus.tt, p.minus.ct,
    )
}
