//! # 高对称路径采样
//!
//! 沿 X → Γ → Y → C → X 计算 E±，每段 n+1 个点。
//! 每段第一个点的增量为零，与上一段终点重合。
//!
//! ## 依赖关系
//! - 被 `band/export.rs` 和 `band/plot.rs` 使用
//! - 使用 `band/model.rs`

use crate::band::model::HbModel;
use crate::models::DispersionInput;

use std::f64::consts::PI;

/// 路径上的高对称点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryPoint {
    Gamma,
    X,
    Y,
    C,
}

impl SymmetryPoint {
    /// (kc, kt) 坐标
    pub fn coordinates(&self, a: f64, b: f64) -> (f64, f64) {
        match self {
            SymmetryPoint::Gamma => (0.0, 0.0),
            SymmetryPoint::X => (PI / a, 0.0),
            SymmetryPoint::Y => (0.0, PI / b),
            SymmetryPoint::C => (PI / a, PI / b),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SymmetryPoint::Gamma => "Γ",
            SymmetryPoint::X => "X",
            SymmetryPoint::Y => "Y",
            SymmetryPoint::C => "C",
        }
    }
}

/// 路径顺序
pub const BAND_PATH: [SymmetryPoint; 5] = [
    SymmetryPoint::X,
    SymmetryPoint::Gamma,
    SymmetryPoint::Y,
    SymmetryPoint::C,
    SymmetryPoint::X,
];

/// 单个采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// 累计路径长度 (Å⁻¹)
    pub x: f64,
    pub kc: f64,
    pub kt: f64,
    pub e_plus: f64,
    pub e_minus: f64,
}

/// 完整路径
#[derive(Debug, Clone)]
pub struct BandPath {
    pub samples: Vec<PathSample>,
    /// 高对称点在 x 轴上的位置
    pub ticks: Vec<(f64, &'static str)>,
}

/// 沿高对称路径采样
pub fn sample_path(input: &DispersionInput) -> BandPath {
    let model = HbModel::from_input(input);
    let n = input.n.max(1);

    let mut samples = Vec::with_capacity((BAND_PATH.len() - 1) * (n + 1));
    let mut ticks = Vec::with_capacity(BAND_PATH.len());
    let mut x = 0.0;
    ticks.push((x, BAND_PATH[0].symbol()));

    for leg in BAND_PATH.windows(2) {
        let (c0, t0) = leg[0].coordinates(input.a, input.b);
        let (c1, t1) = leg[1].coordinates(input.a, input.b);
        let dkc = (c1 - c0) / n as f64;
        let dkt = (t1 - t0) / n as f64;
        let step = dkc.hypot(dkt);

        for i in 0..=n {
            if i > 0 {
                x += step;
            }
            let kc = c0 + i as f64 * dkc;
            let kt = t0 + i as f64 * dkt;
            let (e_plus, e_minus) = model.energies(kc, kt);
            samples.push(PathSample {
                x,
                kc,
                kt,
                e_plus,
                e_minus,
            });
        }

        ticks.push((x, leg[1].symbol()));
    }

    BandPath { samples, ticks }
}

impl BandPath {
    /// `x  E+  E−` 文本
    pub fn to_text(&self) -> String {
        let mut out = String::from("# x(1/A)  E+(meV)  E-(meV)\n");
        for s in &self.samples {
            out.push_str(&format!("{:.8}  {:.6}  {:.6}\n", s.x, s.e_plus, s.e_minus));
        }
        out
    }

    /// 路径上的能量范围 (min, max)
    pub fn energy_range(&self) -> (f64, f64) {
        self.samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), s| (lo.min(s.e_minus), hi.max(s.e_plus)),
        )
    }

    pub fn total_length(&self) -> f64 {
        self.samples.last().map(|s| s.x).unwrap_or(0.0)
    }
}
