//! # 能带面采样
//!
//! 在第一象限布里渊区 [0, π/a] × [0, π/b] 上以 (n+1)² 网格采样 E±。
//! 由 E(−k) = E(k) 对称性，第一象限即可代表整个能带。
//!
//! ## 依赖关系
//! - 被 `band/optimizer.rs` 用于初始种群播种
//! - 被 `band/export.rs` 导出
//! - 使用 `band/model.rs`

use crate::band::model::HbModel;
use crate::models::{BandEdge, BandKind, DispersionInput};

use std::f64::consts::PI;

/// 能带面网格
#[derive(Debug, Clone)]
pub struct BandSurface {
    pub n: usize,
    /// Δkc = π/(a·n)
    pub dkc: f64,
    /// Δkt = π/(b·n)
    pub dkt: f64,
    /// E+[i][j]，i 对应 kc，j 对应 kt
    pub e_plus: Vec<Vec<f64>>,
    pub e_minus: Vec<Vec<f64>>,
}

impl BandSurface {
    /// 采样整个第一象限
    pub fn sample(input: &DispersionInput) -> Self {
        let model = HbModel::from_input(input);
        let n = input.n;
        let dkc = PI / (input.a * n as f64);
        let dkt = PI / (input.b * n as f64);

        let mut e_plus = vec![vec![0.0; n + 1]; n + 1];
        let mut e_minus = vec![vec![0.0; n + 1]; n + 1];

        for i in 0..=n {
            for j in 0..=n {
                let (p, m) = model.energies(i as f64 * dkc, j as f64 * dkt);
                e_plus[i][j] = p;
                e_minus[i][j] = m;
            }
        }

        BandSurface {
            n,
            dkc,
            dkt,
            e_plus,
            e_minus,
        }
    }

    /// 网格上的能带边：HOMO 取 E+ 最大，LUMO 取 E− 最小
    ///
    /// 相等时保留先遇到的点（靠近原点）。
    pub fn grid_extremum(&self, kind: BandKind) -> BandEdge {
        let mut best = BandEdge {
            kc: 0.0,
            kt: 0.0,
            energy: match kind {
                BandKind::Homo => f64::NEG_INFINITY,
                BandKind::Lumo => f64::INFINITY,
            },
        };

        for i in 0..=self.n {
            for j in 0..=self.n {
                let (energy, better) = match kind {
                    BandKind::Homo => (self.e_plus[i][j], self.e_plus[i][j] > best.energy),
                    BandKind::Lumo => (self.e_minus[i][j], self.e_minus[i][j] < best.energy),
                };
                if better {
                    best = BandEdge {
                        kc: i as f64 * self.dkc,
                        kt: j as f64 * self.dkt,
                        energy,
                    };
                }
            }
        }

        best
    }

    /// 导出为 `kc kt E+ E−` 文本
    pub fn to_text(&self) -> String {
        let mut out = String::from("# kc(1/A)  kt(1/A)  E+(meV)  E-(meV)\n");
        for i in 0..=self.n {
            for j in 0..=self.n {
                out.push_str(&format!(
                    "{:.8} {:.8} {:.6} {:.6}\n",
                    i as f64 * self.dkc,
                    j as f64 * self.dkt,
                    self.e_plus[i][j],
                    self.e_minus[i][j]
                ));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferIntegrals;

    fn isotropic(label: &str, kind: BandKind, n: usize) -> DispersionInput {
        DispersionInput {
            label: label.to_string(),
            kind,
            n,
            a: 1.0,
            b: 1.0,
            t: TransferIntegrals::uniform(100.0),
        }
    }

    #[test]
    fn test_surface_shape_and_steps() {
        let surface = BandSurface::sample(&isotropic("iso_HOMO", BandKind::Homo, 8));
        assert_eq!(surface.e_plus.len(), 9);
        assert_eq!(surface.e_minus[0].len(), 9);
        assert!((surface.dkc - PI / 8.0).abs() < 1e-15);
        assert!((surface.e_plus[0][0] - 600.0).abs() < 1e-10);
        for i in 0..=8 {
            for j in 0..=8 {
                assert!(surface.e_plus[i][j] >= surface.e_minus[i][j]);
            }
        }
    }

    #[test]
    fn test_grid_extremum() {
        let homo = BandSurface::sample(&isotropic("iso_HOMO", BandKind::Homo, 12));
        let edge = homo.grid_extremum(BandKind::Homo);
        assert_eq!((edge.kc, edge.kt), (0.0, 0.0));
        assert!((edge.energy - 600.0).abs() < 1e-10);

        // LUMO 极小值位于 cos(kc·a/2) = 1/2，即 kc = 2π/3
        let lumo = BandSurface::sample(&isotropic("iso_LUMO", BandKind::Lumo, 12));
        let edge = lumo.grid_extremum(BandKind::Lumo);
        assert!((edge.kc - 2.0 * PI / 3.0).abs() < 1e-12);
        assert!(edge.kt.abs() < 1e-12);
        assert!((edge.energy + 300.0).abs() < 1e-9);
    }
}
