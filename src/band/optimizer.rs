//! # 能带边全局优化器
//!
//! 在整个布里渊区 kc ∈ [−π/a, π/a], kt ∈ [−π/b, π/b] 上用差分进化
//! (best1bin) 搜索能带边：HOMO 取 E+ 的最大值，LUMO 取 E− 的最小值。
//!
//! ## 算法概述
//! 1. Latin hypercube 初始种群，额外放入原点和网格极值点
//! 2. best1bin 变异（F 在 [0.5, 1) 内抖动）+ 二项交叉 (CR = 0.7)
//! 3. 目标值标准差 ≤ 1e-6 meV 时收敛，超过代数上限视为失败
//! 4. 用解析梯度/Hessian 做有界 Newton 精修，步长 ≤ 1e-8 时停止
//! 5. 在目标值差 ≤ 1e-9 meV 的候选中，优先 kc²+kt² 小者，再按 (kc, kt) 字典序
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `band/model.rs`, `band/surface.rs`
//! - 使用 `rand` 生成可复现的随机数

use crate::band::model::HbModel;
use crate::band::surface::BandSurface;
use crate::models::{BandEdge, BandKind, DispersionInput, EdgeFailure, EdgeSearch};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
/// 差分进化参数
#[derive(Debug, Clone, Copy)]
pub struct DeConfig {
    /// 种群大小（至少 30）
    pub population: usize,
    /// 最大代数
    pub max_generations: usize,
    /// 目标函数收敛阈值 (meV)
    pub tol: f64,
    /// 坐标收敛阈值 (Å⁻¹)
    pub xtol: f64,
    /// 并列判定阈值 (meV)
    pub tie_tol: f64,
    /// 变异因子抖动范围
    pub mutation: (f64, f64),
    /// 交叉概率
    pub recombination: f64,
    /// 随机数种子
    pub seed: u64,
}

impl Default for DeConfig {
    fn default() -> Self {
        DeConfig {
            population: 30,
            max_generations: 1000,
            tol: 1e-6,
            xtol: 1e-8,
            tie_tol: 1e-9,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            seed: 20240601,
        }
    }
}

/// 能带边优化器
pub struct BandEdgeOptimizer {
    config: DeConfig,
}

/// 目标函数：统一转化为最小化
struct Objective {
    model: HbModel,
    kind: BandKind,
    lower: [f64; 2],
    upper: [f64; 2],
}

impl Objective {
    fn new(input: &DispersionInput) -> Self {
        let (kc_max, kt_max) = input.zone_edge();
        Objective {
            model: HbModel::from_input(input),
            kind: input.kind,
            lower: [-kc_max, -kt_max],
            upper: [kc_max, kt_max],
        }
    }

    fn sign(&self) -> f64 {
        match self.kind {
            BandKind::Homo => -1.0,
            BandKind::Lumo => 1.0,
        }
    }

    fn value(&self, x: &[f64; 2]) -> f64 {
        self.sign() * self.model.band_energy(self.kind, x[0], x[1])
    }

    fn in_bounds(&self, x: &[f64; 2]) -> bool {
        (0..2).all(|d| x[d] >= self.lower[d] && x[d] <= self.upper[d])
    }
}

impl BandEdgeOptimizer {
    pub fn new(config: DeConfig) -> Self {
        let mut config = config;
        config.population = config.population.max(30);
        Self { config }
    }

    /// 搜索能带边；`surface` 是同一输入的网格采样，其极值点放入初始种群
    pub fn find_band_edge(&self, input: &DispersionInput, surface: &BandSurface) -> EdgeSearch {
        let objective = Objective::new(input);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let seed_point = surface.grid_extremum(input.kind);
        let mut population = self.initial_population(&objective, &mut rng, &seed_point);
        let mut fitness: Vec<f64> = population.iter().map(|x| objective.value(x)).collect();
        let mut evaluations = fitness.len();

        let mut best = argmin(&fitness);
        let mut converged = false;
        let mut non_finite = false;
        let mut generations = 0;

        while generations < self.config.max_generations {
            generations += 1;

            for i in 0..population.len() {
                let trial = self.trial_vector(&objective, &population, i, best, &mut rng);
                let f_trial = objective.value(&trial);
                evaluations += 1;

                if f_trial <= fitness[i] {
                    population[i] = trial;
                    fitness[i] = f_trial;
                    if f_trial < fitness[best] {
                        best = i;
                    }
                }
            }

            if !fitness.iter().all(|f| f.is_finite()) {
                non_finite = true;
                break;
            }

            if std_dev(&fitness) <= self.config.tol {
                converged = true;
                break;
            }
        }

        log::debug!(
            "{}: DE stopped after {} generations ({} evaluations), converged = {}",
            input.label,
            generations,
            evaluations,
            converged
        );

        // 每个成员都精修，同一盆地内的点收敛到同一极值
        let mut candidates: Vec<([f64; 2], f64)> = population
            .iter()
            .map(|x| {
                let polished = self.polish(&objective, *x, &mut evaluations);
                (polished, objective.value(&polished))
            })
            .collect();
        evaluations += candidates.len();

        // k → −k 对称的像点
        let mirrors: Vec<([f64; 2], f64)> = candidates
            .iter()
            .map(|(x, _)| {
                let m = [-x[0], -x[1]];
                (m, objective.value(&m))
            })
            .collect();
        evaluations += mirrors.len();
        candidates.extend(mirrors);

        let (x_best, f_best) = self.select_with_ties(&candidates);
        let energy = objective.sign() * f_best;
        let finite = x_best.iter().all(|v| v.is_finite()) && energy.is_finite();
        let failure = if non_finite || !finite {
            Some(EdgeFailure::NonFinite)
        } else if !converged {
            Some(EdgeFailure::GenerationCap { generations })
        } else {
            None
        };

        EdgeSearch {
            edge: BandEdge {
                kc: x_best[0],
                kt: x_best[1],
                energy,
            },
            failure,
            generations,
            evaluations,
        }
    }

    /// Latin hypercube 初始种群 + 原点 + 网格极值
    fn initial_population(
        &self,
        objective: &Objective,
        rng: &mut StdRng,
        seed_point: &BandEdge,
    ) -> Vec<[f64; 2]> {
        let np = self.config.population;
        let mut population = vec![[0.0; 2]; np];

        for d in 0..2 {
            let mut segments: Vec<usize> = (0..np).collect();
            segments.shuffle(rng);
            let width = (objective.upper[d] - objective.lower[d]) / np as f64;
            for (member, segment) in population.iter_mut().zip(segments) {
                member[d] = objective.lower[d] + width * (segment as f64 + rng.gen::<f64>());
            }
        }

        population[0] = [0.0, 0.0];
        population[1] = [seed_point.kc, seed_point.kt];
        population
    }

    /// best1bin 试验向量
    fn trial_vector(
        &self,
        objective: &Objective,
        population: &[[f64; 2]],
        target: usize,
        best: usize,
        rng: &mut StdRng,
    ) -> [f64; 2] {
        let np = population.len();
        let r1 = pick_distinct(rng, np, &[target]);
        let r2 = pick_distinct(rng, np, &[target, r1]);

        let (lo, hi) = self.config.mutation;
        let f = lo + (hi - lo) * rng.gen::<f64>();

        let mut trial = population[target];
        let forced = rng.gen_range(0..2);
        for d in 0..2 {
            if d == forced || rng.gen::<f64>() < self.config.recombination {
                let v = population[best][d] + f * (population[r1][d] - population[r2][d]);
                trial[d] = if v < objective.lower[d] || v > objective.upper[d] {
                    objective.lower[d] + (objective.upper[d] - objective.lower[d]) * rng.gen::<f64>()
                } else {
                    v
                };
            }
        }

        trial
    }

    /// 有界 Newton 精修：仅接受降低目标值且留在区域内的步
    fn polish(&self, objective: &Objective, start: [f64; 2], evaluations: &mut usize) -> [f64; 2] {
        let sign = objective.sign();
        let mut x = start;
        let mut f = objective.value(&x);

        for _ in 0..50 {
            let g = objective.model.band_gradient(objective.kind, x[0], x[1]);
            let h = objective.model.band_curvature(objective.kind, x[0], x[1]);
            let (g0, g1) = (sign * g[0], sign * g[1]);
            let (hcc, htt, hct) = (sign * h.cc, sign * h.tt, sign * h.ct);

            let det = hcc * htt - hct * hct;
            if !(hcc > 0.0 && det > 0.0) {
                break;
            }

            let step = [
                -(htt * g0 - hct * g1) / det,
                -(hcc * g1 - hct * g0) / det,
            ];
            let candidate = [x[0] + step[0], x[1] + step[1]];
            if !objective.in_bounds(&candidate) {
                break;
            }

            let f_candidate = objective.value(&candidate);
            *evaluations += 1;
            if f_candidate > f {
                break;
            }

            x = candidate;
            f = f_candidate;

            if step[0].hypot(step[1]) <= self.config.xtol {
                break;
            }
        }

        x
    }

    /// 并列候选的选择规则
    fn select_with_ties(&self, candidates: &[([f64; 2], f64)]) -> ([f64; 2], f64) {
        let f_min = candidates
            .iter()
            .map(|(_, f)| *f)
            .fold(f64::INFINITY, f64::min);

        candidates
            .iter()
            .filter(|(_, f)| *f <= f_min + self.config.tie_tol)
            .min_by(|(a, _), (b, _)| compare_tie(a, b))
            .copied()
            .unwrap_or(([f64::NAN, f64::NAN], f64::NAN))
    }
}

impl Default for BandEdgeOptimizer {
    fn default() -> Self {
        Self::new(DeConfig::default())
    }
}

/// kc²+kt² 小者优先，其次 (kc, kt) 字典序
fn compare_tie(a: &[f64; 2], b: &[f64; 2]) -> Ordering {
    let ra = a[0] * a[0] + a[1] * a[1];
    let rb = b[0] * b[0] + b[1] * b[1];
    let radius = if (ra - rb).abs() <= 1e-10 * ra.max(rb).max(1.0) {
        Ordering::Equal
    } else {
        ra.total_cmp(&rb)
    };
    radius
        .then(a[0].total_cmp(&b[0]))
        .then(a[1].total_cmp(&b[1]))
}

fn pick_distinct(rng: &mut StdRng, n: usize, exclude: &[usize]) -> usize {
    loop {
        let r = rng.gen_range(0..n);
        if !exclude.contains(&r) {
            return r;
        }
    }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
