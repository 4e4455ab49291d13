//! # 四点法重组能驱动器
//!
//! 按依赖顺序执行七步外部计算，检查每步输出，组装阳离子/阴离子重组能。
//!
//! ## 步骤
//! | # | 电荷 | 类型 | 几何来源 |
//! |---|------|------|----------|
//! | 1 | 0  | EG | 源几何 |
//! | 2 | +1 | EG | #1 |
//! | 3 | −1 | EG | #1 |
//! | 4 | +0 | SP | #2 |
//! | 5 | −0 | SP | #3 |
//! | 6 | +1 | SP | #1 |
//! | 7 | −1 | SP | #1 |
//!
//! 分三个阶段执行：`[1]`, `[2, 3, 6, 7]`, `[4, 5]`。并行模式下同一阶段的作业先全部提交再等待。
//!
//! ## 检查
//! - 输出必须包含 `Normal termination`
//! - EG 步骤的所有频率必须为正
//! - 已有合格输出直接复用（重新解析并检查），不再调用引擎
//!
//! ## 依赖关系
//! - 被 `commands/reorg.rs` 调用
//! - 使用 `reorg/engine.rs`, `reorg/summary.rs`
//! - 使用 `parsers/gjf.rs`, `parsers/gaussian_log.rs`

use crate::error::{OscreenError, Result};
use crate::models::{
    Atom, CalcKind, Charge, EnergyRecord, FrequencySet, Molecule, ReorgComponents, Step,
};
use crate::parsers;
use crate::parsers::gaussian_log::{self, GaussianLog};
use crate::parsers::gjf::{self, EngineInput};
use crate::reorg::engine::{Engine, EngineJob, JobHandle};
use crate::reorg::summary::{self, ReorgSummary};

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 七个步骤，按序号排列
pub const STEPS: [Step; 7] = [
    Step { index: 1, charge: Charge::Neutral, kind: CalcKind::Eg },
    Step { index: 2, charge: Charge::Cation, kind: CalcKind::Eg },
    Step { index: 3, charge: Charge::Anion, kind: CalcKind::Eg },
    Step { index: 4, charge: Charge::NeutralAtCation, kind: CalcKind::Sp },
    Step { index: 5, charge: Charge::NeutralAtAnion, kind: CalcKind::Sp },
    Step { index: 6, charge: Charge::Cation, kind: CalcKind::Sp },
    Step { index: 7, charge: Charge::Anion, kind: CalcKind::Sp },
];

/// 执行阶段（步骤序号）
pub const STAGES: [&[usize]; 3] = [&[1], &[2, 3, 6, 7], &[4, 5]];

/// 几何来源步骤；None 表示源几何
pub fn geometry_source(index: usize) -> Option<usize> {
    match index {
        2 | 3 | 6 | 7 => Some(1),
        4 => Some(2),
        5 => Some(3),
        _ => None,
    }
}

/// 泛函/基组设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Functional {
    /// 用户给出的原始字符串
    pub raw: String,
    /// 去掉色散后缀的 `method/basis`
    pub method: String,
    /// 是否附加 D3 色散校正
    pub dispersion: bool,
}

impl Functional {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(OscreenError::InvalidArgument(format!(
                "invalid functional '{}'",
                raw
            )));
        }

        // `+D3` 可作后缀，也可紧跟泛函名（`b3lyp+D3/6-31g(d)`）
        let upper = raw.to_ascii_uppercase();
        let (method, dispersion) = match upper.find("+D3") {
            None => (raw.to_string(), false),
            Some(at) if upper.rfind("+D3") == Some(at) => {
                let after = &raw[at + 3..];
                if !(after.is_empty() || after.starts_with('/')) {
                    return Err(OscreenError::InvalidArgument(format!(
                        "invalid dispersion suffix in functional '{}'",
                        raw
                    )));
                }
                (format!("{}{}", &raw[..at], after), true)
            }
            Some(_) => {
                return Err(OscreenError::InvalidArgument(format!(
                    "functional '{}' repeats +D3",
                    raw
                )))
            }
        };
        if method.is_empty() || method.starts_with('/') || method.ends_with('/') {
            return Err(OscreenError::InvalidArgument(format!(
                "invalid functional '{}'",
                raw
            )));
        }

        Ok(Functional {
            raw: raw.to_string(),
            method,
            dispersion,
        })
    }

    /// 文件名标记：`/` → `_`，`+` → `p`，去掉括号和逗号
    pub fn tag(&self) -> String {
        self.raw
            .chars()
            .filter_map(|c| match c {
                '/' => Some('_'),
                '+' => Some('p'),
                '(' | ')' | ',' => None,
                other => Some(other),
            })
            .collect()
    }

    /// 路由行；仅在几何带有连接性块时要求 `geom=connectivity`
    pub fn route(&self, kind: CalcKind, connectivity: bool) -> String {
        let job = match kind {
            CalcKind::Eg => "opt freq ",
            CalcKind::Sp => "",
        };
        let dispersion = if self.dispersion {
            " empiricaldispersion=gd3"
        } else {
            ""
        };
        let geom = if connectivity { " geom=connectivity" } else { "" };
        format!("# {}{}{}{}", job, self.method, dispersion, geom)
    }
}

/// 驱动器配置
#[derive(Debug, Clone)]
pub struct ReorgConfig {
    pub functional: Functional,
    pub workdir: PathBuf,
    pub nproc: u32,
    pub mem: String,
    /// 同一阶段的步骤同时提交
    pub parallel: bool,
}

/// 单步输出（已通过检查）
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub step: Step,
    pub energy: f64,
    pub geometry: Option<Vec<Atom>>,
    pub frequencies: Option<FrequencySet>,
}

/// 一次循环的结果
#[derive(Debug, Clone)]
pub struct ReorgOutcome {
    pub summary: ReorgSummary,
    pub summary_path: PathBuf,
    /// 实际调用引擎的步骤数
    pub launched: usize,
    /// 复用已有输出的步骤数
    pub reused: usize,
}

/// 工作目录锁，析构时删除
#[derive(Debug)]
pub struct WorkdirLock {
    path: PathBuf,
}

impl WorkdirLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => OscreenError::Locked {
                    path: path.display().to_string(),
                },
                _ => OscreenError::write(path, e),
            })?;
        writeln!(file, "{}", std::process::id()).map_err(|e| OscreenError::write(path, e))?;
        Ok(WorkdirLock {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

/// 四点法驱动器
pub struct ReorgDriver<'a, E: Engine + ?Sized> {
    engine: &'a E,
    config: &'a ReorgConfig,
}

impl<'a, E: Engine + ?Sized> ReorgDriver<'a, E> {
    pub fn new(engine: &'a E, config: &'a ReorgConfig) -> Self {
        ReorgDriver { engine, config }
    }

    /// 锁文件路径
    pub fn lock_path(&self, material: &str) -> PathBuf {
        self.config.workdir.join(format!(
            "{}_{}.lock",
            material,
            self.config.functional.tag()
        ))
    }

    /// 某一步的作业描述
    pub fn job(&self, material: &str, step: Step) -> EngineJob {
        let name = format!(
            "{}_{}_{}_{}",
            material,
            self.config.functional.tag(),
            step.charge.file_tag(),
            step.kind
        );
        EngineJob {
            step,
            workdir: self.config.workdir.clone(),
            input: self.config.workdir.join(format!("{}.gjf", name)),
            log: self.config.workdir.join(format!("{}.log", name)),
            name,
        }
    }

    /// 执行完整的四点循环
    pub fn run(&self, material: &str) -> Result<ReorgOutcome> {
        let _lock = WorkdirLock::acquire(&self.lock_path(material))?;
        let source = parsers::load_source_geometry(&self.config.workdir, material)?;

        log::debug!(
            "{}: four-point cycle ({} atoms) with {} via {}",
            material,
            source.num_atoms(),
            self.config.functional.raw,
            self.engine.describe()
        );

        let mut outputs: BTreeMap<usize, StepOutput> = BTreeMap::new();
        let mut launched = 0;
        let mut reused = 0;

        for stage in STAGES {
            let mut pending = Vec::new();

            for &index in stage {
                let step = STEPS[index - 1];
                let job = self.job(material, step);

                if let Some(output) = self.reuse(&job)? {
                    log::debug!("{}: reusing {}", step, job.log.display());
                    reused += 1;
                    outputs.insert(index, output);
                    continue;
                }

                let molecule = self.step_geometry(&source, index, &outputs)?;
                self.prepare(material, &job, &molecule)?;
                pending.push(job);
            }

            let finished = if self.config.parallel {
                self.launch_parallel(&pending, &mut launched)?
            } else {
                self.launch_sequential(&pending, &mut launched)?
            };
            for output in finished {
                outputs.insert(output.step.index, output);
            }
        }

        let mut energies = [0.0; 7];
        for (i, energy) in energies.iter_mut().enumerate() {
            *energy = outputs
                .get(&(i + 1))
                .map(|o| o.energy)
                .ok_or_else(|| OscreenError::Other(format!("missing output of step #{}", i + 1)))?;
        }
        let components = ReorgComponents::from_energies(&energies);

        let logs: Vec<PathBuf> = STEPS.iter().map(|s| self.job(material, *s).log).collect();
        let log_refs: Vec<&Path> = logs.iter().map(PathBuf::as_path).collect();
        let timestamp = summary::format_utc(summary::newest_mtime(&log_refs)?);

        let summary = ReorgSummary {
            timestamp,
            material: material.to_string(),
            functional: self.config.functional.raw.clone(),
            records: outputs
                .values()
                .map(|o| EnergyRecord {
                    step: o.step,
                    energy: o.energy,
                })
                .collect(),
            components,
            min_frequencies: outputs
                .values()
                .filter(|o| o.step.kind == CalcKind::Eg)
                .map(|o| (o.step, o.frequencies.as_ref().and_then(FrequencySet::min)))
                .collect(),
        };

        let summary_path = summary.write(&self.config.workdir, &self.config.functional.tag())?;

        if let Some(component) = components.negative_component() {
            return Err(OscreenError::UnphysicalReorganization {
                component: component.to_string(),
                dump: summary.render(),
            });
        }

        Ok(ReorgOutcome {
            summary,
            summary_path,
            launched,
            reused,
        })
    }

    /// 已有正常结束的输出则复用
    fn reuse(&self, job: &EngineJob) -> Result<Option<StepOutput>> {
        if !job.log.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&job.log).map_err(|e| OscreenError::read(&job.log, e))?;
        if !gaussian_log::is_normal_termination(&content) {
            log::debug!(
                "{}: existing {} did not terminate normally, rerunning",
                job.step,
                job.log.display()
            );
            return Ok(None);
        }
        let parsed = gaussian_log::parse_log_content(&content, &job.log.display().to_string())?;
        verify_output(job, parsed).map(Some)
    }

    fn step_geometry(
        &self,
        source: &Molecule,
        index: usize,
        outputs: &BTreeMap<usize, StepOutput>,
    ) -> Result<Molecule> {
        match geometry_source(index) {
            None => Ok(source.clone()),
            Some(from) => outputs
                .get(&from)
                .and_then(|o| o.geometry.clone())
                .map(|atoms| source.with_atoms(atoms))
                .ok_or_else(|| {
                    OscreenError::Other(format!(
                        "geometry of step #{} is not available for step #{}",
                        from, index
                    ))
                }),
        }
    }

    /// 写出引擎输入
    fn prepare(&self, material: &str, job: &EngineJob, molecule: &Molecule) -> Result<()> {
        let (charge, multiplicity) = job.step.charge.charge_spin();
        let input = EngineInput {
            link0: vec![
                format!("nprocshared={}", self.config.nproc),
                format!("mem={}", self.config.mem),
                format!("chk={}.chk", job.name),
            ],
            route: self
                .config
                .functional
                .route(job.step.kind, molecule.has_connectivity()),
            title: format!("{} step {} {}", material, job.step, self.config.functional.raw),
            charge,
            multiplicity,
            molecule,
        };
        gjf::write_gjf_file(&input, &job.input)
    }

    fn launch_sequential(
        &self,
        jobs: &[EngineJob],
        launched: &mut usize,
    ) -> Result<Vec<StepOutput>> {
        let mut finished = Vec::with_capacity(jobs.len());
        for job in jobs {
            *launched += 1;
            self.engine.run(job)?;
            finished.push(collect_output(job)?);
        }
        Ok(finished)
    }

    /// 同一阶段全部提交后再逐个等待；任何失败都不消费本阶段输出
    fn launch_parallel(&self, jobs: &[EngineJob], launched: &mut usize) -> Result<Vec<StepOutput>> {
        let handles: Vec<Result<JobHandle>> = jobs
            .iter()
            .map(|job| {
                *launched += 1;
                self.engine.submit(job)
            })
            .collect();

        let mut first_error = None;
        let mut finished = Vec::with_capacity(jobs.len());

        for (job, handle) in jobs.iter().zip(handles) {
            let result = handle
                .and_then(|h| self.engine.wait(job, h))
                .and_then(|_| collect_output(job));
            match result {
                Ok(output) => finished.push(output),
                Err(e) => {
                    log::debug!("{} failed: {}", job.step, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(finished),
        }
    }
}

/// 解析并检查引擎输出
fn collect_output(job: &EngineJob) -> Result<StepOutput> {
    if !job.log.exists() {
        return Err(OscreenError::AbnormalTermination {
            path: job.log.display().to_string(),
        });
    }
    let parsed = gaussian_log::parse_log_file(&job.log)?;
    verify_output(job, parsed)
}

fn verify_output(job: &EngineJob, parsed: GaussianLog) -> Result<StepOutput> {
    let path = job.log.display().to_string();

    if !parsed.normal_termination {
        return Err(OscreenError::AbnormalTermination { path });
    }

    let energy = parsed.scf_energy.ok_or_else(|| OscreenError::ParseError {
        format: "gaussian log".to_string(),
        path: path.clone(),
        reason: "no SCF Done line".to_string(),
    })?;

    if job.step.kind == CalcKind::Sp {
        return Ok(StepOutput {
            step: job.step,
            energy,
            geometry: parsed.geometry,
            frequencies: None,
        });
    }

    let geometry = parsed.geometry.ok_or_else(|| OscreenError::ParseError {
        format: "gaussian log".to_string(),
        path: path.clone(),
        reason: "no optimized geometry".to_string(),
    })?;

    if parsed.frequencies.values.is_empty() {
        return Err(OscreenError::ParseError {
            format: "gaussian log".to_string(),
            path,
            reason: "no vibrational frequencies".to_string(),
        });
    }

    let imaginary = parsed.frequencies.imaginary_modes();
    if !imaginary.is_empty() {
        let modes = imaginary
            .iter()
            .map(|(mode, f)| format!("  mode #{}: {:.4} cm^-1", mode, f))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(OscreenError::NotAMinimum {
            step: job.step.to_string(),
            modes,
        });
    }

    Ok(StepOutput {
        step: job.step,
        energy,
        geometry: Some(geometry),
        frequencies: Some(parsed.frequencies),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HARTREE_TO_MEV;
    use crate::parsers::gaussian_log::tests::synthetic_log;
    use approx::assert_relative_eq;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    const SOURCE: &str = "%nprocshared=4
%mem=4GB
# opt b3lyp/6-31g(d) geom=connectivity

thiophene

0 1
 S                  0.00000000    1.18820000    0.00000000
 C                  1.23430000    0.00000000    0.00000000
 C                 -1.23430000    0.00000000    0.00000000
 H                  2.26000000    0.33000000    0.00000000

 1 2 1.5 3 1.5
 2 4 1.0
 3
 4

";

    const PHYSICAL: [f64; 7] = [-100.0, -99.75, -100.05, -99.995, -99.99, -99.74, -100.04];
    const UNPHYSICAL: [f64; 7] = [-100.0, -99.98, -99.97, -99.995, -99.985, -99.99, -99.98];

    /// 写出合成输出的测试引擎
    struct StubEngine {
        energies: [f64; 7],
        frequencies: HashMap<usize, Vec<f64>>,
        calls: Cell<usize>,
        order: RefCell<Vec<usize>>,
    }

    impl StubEngine {
        fn new(energies: [f64; 7]) -> Self {
            StubEngine {
                energies,
                frequencies: HashMap::new(),
                calls: Cell::new(0),
                order: RefCell::new(Vec::new()),
            }
        }
    }

    impl Engine for StubEngine {
        fn describe(&self) -> String {
            "stub".to_string()
        }

        fn submit(&self, job: &EngineJob) -> Result<JobHandle> {
            self.calls.set(self.calls.get() + 1);
            self.order.borrow_mut().push(job.step.index);

            let molecule = gjf::parse_gjf_file(&job.input)?;
            // EG 步骤模拟优化：整体平移
            let shift = 0.01 * job.step.index as f64;
            let atoms: Vec<Atom> = molecule
                .atoms
                .iter()
                .map(|a| {
                    let mut p = a.position;
                    if job.step.kind == CalcKind::Eg {
                        p[0] += shift;
                    }
                    Atom::new(a.element.clone(), p)
                })
                .collect();

            let default_freqs = vec![35.2, 80.1, 120.7];
            let freqs = match job.step.kind {
                CalcKind::Eg => Some(
                    self.frequencies
                        .get(&job.step.index)
                        .cloned()
                        .unwrap_or(default_freqs),
                ),
                CalcKind::Sp => None,
            };

            let log = synthetic_log(
                self.energies[job.step.index - 1],
                &atoms,
                freqs.as_deref(),
            );
            fs::write(&job.log, log).map_err(|e| OscreenError::write(&job.log, e))?;
            Ok(JobHandle::Finished)
        }

        fn wait(&self, _job: &EngineJob, _handle: JobHandle) -> Result<()> {
            Ok(())
        }
    }

    fn setup(parallel: bool) -> (TempDir, ReorgConfig) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("thiophene.gjf"), SOURCE).unwrap();
        let config = ReorgConfig {
            functional: Functional::parse("b3lyp/6-31g(d)").unwrap(),
            workdir: dir.path().to_path_buf(),
            nproc: 4,
            mem: "4GB".to_string(),
            parallel,
        };
        (dir, config)
    }

    #[test]
    fn test_functional_tag_and_route() {
        let f = Functional::parse("b3lyp/6-311+g(d,p)").unwrap();
        assert_eq!(f.tag(), "b3lyp_6-311pgdp");
        assert!(!f.dispersion);
        assert_eq!(
            f.route(CalcKind::Eg, true),
            "# opt freq b3lyp/6-311+g(d,p) geom=connectivity"
        );
        assert_eq!(f.route(CalcKind::Sp, true), "# b3lyp/6-311+g(d,p) geom=connectivity");
        assert_eq!(f.route(CalcKind::Eg, false), "# opt freq b3lyp/6-311+g(d,p)");

        let d3 = Functional::parse("pbepbe/6-31g(d)+D3").unwrap();
        assert!(d3.dispersion);
        assert_eq!(d3.method, "pbepbe/6-31g(d)");
        assert_eq!(
            d3.route(CalcKind::Sp, true),
            "# pbepbe/6-31g(d) empiricaldispersion=gd3 geom=connectivity"
        );

        assert!(Functional::parse("").is_err());
        assert!(Functional::parse("b3lyp 6-31g").is_err());
        assert!(Functional::parse("+D3").is_err());
    }

    #[test]
    fn test_functional_dispersion_after_method() {
        let d3 = Functional::parse("b3lyp+d3/6-31g(d)").unwrap();
        assert!(d3.dispersion);
        assert_eq!(d3.method, "b3lyp/6-31g(d)");
        assert_eq!(d3.raw, "b3lyp+d3/6-31g(d)");
        assert_eq!(
            d3.route(CalcKind::Eg, true),
            "# opt freq b3lyp/6-31g(d) empiricaldispersion=gd3 geom=connectivity"
        );
        assert!(!d3.route(CalcKind::Sp, true).contains("+d3"));

        assert!(Functional::parse("b3lyp+D3bj/6-31g(d)").is_err());
        assert!(Functional::parse("b3lyp+D3/6-31g(d)+D3").is_err());
    }

    #[test]
    fn test_stages_respect_dependencies() {
        let mut done: Vec<usize> = Vec::new();
        for stage in STAGES {
            for &index in stage {
                if let Some(src) = geometry_source(index) {
                    assert!(done.contains(&src), "step {} before {}", index, src);
                }
            }
            done.extend_from_slice(stage);
        }
        done.sort();
        assert_eq!(done, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_full_cycle() {
        let (_dir, config) = setup(false);
        let engine = StubEngine::new(PHYSICAL);
        let outcome = ReorgDriver::new(&engine, &config).run("thiophene").unwrap();

        assert_eq!(engine.calls.get(), 7);
        assert_eq!(outcome.launched, 7);
        assert_eq!(*engine.order.borrow(), vec![1, 2, 3, 6, 7, 4, 5]);

        let c = outcome.summary.components;
        assert_relative_eq!(c.cation_hartree(), 0.015, epsilon = 1e-9);
        assert_relative_eq!(c.anion_hartree(), 0.02, epsilon = 1e-9);
        assert_relative_eq!(c.cation_mev(), 0.015 * 27211.38602, epsilon = 1e-6);
        assert_relative_eq!(HARTREE_TO_MEV, 27211.38602, epsilon = 1e-9);
        assert!(c.cation_mev() >= 0.0 && c.anion_mev() >= 0.0);

        assert_eq!(outcome.summary.records.len(), 7);
        assert_eq!(outcome.summary.min_frequencies.len(), 3);
        assert!(outcome.summary_path.ends_with("thiophene_ReorgEnergy_b3lyp_6-31gd.txt"));
        // 锁已释放
        assert!(!config.workdir.join("thiophene_b3lyp_6-31gd.lock").exists());
    }

    #[test]
    fn test_geometry_flows_between_steps() {
        let (dir, config) = setup(true);
        let engine = StubEngine::new(PHYSICAL);
        ReorgDriver::new(&engine, &config).run("thiophene").unwrap();

        let cation_log =
            gaussian_log::parse_log_file(&dir.path().join("thiophene_b3lyp_6-31gd_p1_EG.log"))
                .unwrap();
        let sp_input =
            gjf::parse_gjf_file(&dir.path().join("thiophene_b3lyp_6-31gd_p0_SP.gjf")).unwrap();
        let cation_geom = cation_log.geometry.unwrap();
        for (a, b) in sp_input.atoms.iter().zip(cation_geom.iter()) {
            for k in 0..3 {
                assert!((a.position[k] - b.position[k]).abs() < 1e-10);
            }
        }
        // 源几何 + 0.01 (#1) + 0.02 (#2)
        assert!((sp_input.atoms[1].position[0] - (1.2343 + 0.03)).abs() < 1e-6);
        assert_eq!(sp_input.connectivity.lines().count(), 4);

        let text = fs::read_to_string(dir.path().join("thiophene_b3lyp_6-31gd_p0_SP.gjf")).unwrap();
        assert!(text.contains("\n0 1\n"));
        let text = fs::read_to_string(dir.path().join("thiophene_b3lyp_6-31gd_m1_SP.gjf")).unwrap();
        assert!(text.contains("\n-1 2\n"));
    }

    #[test]
    fn test_source_without_connectivity() {
        let (dir, config) = setup(false);
        let source = "# opt b3lyp/6-31g(d)\n\nh2\n\n0 1\n H 0 0 0\n H 0 0 0.74\n\n";
        fs::write(dir.path().join("h2.gjf"), source).unwrap();

        let engine = StubEngine::new(PHYSICAL);
        ReorgDriver::new(&engine, &config).run("h2").unwrap();
        assert_eq!(engine.calls.get(), 7);

        for step in STEPS {
            let job = ReorgDriver::new(&engine, &config).job("h2", step);
            let text = fs::read_to_string(&job.input).unwrap();
            let route = text.lines().find(|l| l.starts_with('#')).unwrap();
            assert!(!route.contains("connectivity"), "{}: {}", step, route);
            let last = text.lines().filter(|l| !l.trim().is_empty()).last().unwrap();
            assert!(last.starts_with(" H "), "{}: {}", step, last);
        }

        let text = fs::read_to_string(dir.path().join("h2_b3lyp_6-31gd_0_EG.gjf")).unwrap();
        assert!(text.contains("# opt freq b3lyp/6-31g(d)\n"));
    }

    #[test]
    fn test_unphysical_energies_reported_with_summary() {
        let (dir, config) = setup(false);
        let engine = StubEngine::new(UNPHYSICAL);
        let result = ReorgDriver::new(&engine, &config).run("thiophene");

        match result {
            Err(OscreenError::UnphysicalReorganization { component, dump }) => {
                assert_eq!(component, "lambda2(cation)");
                assert!(dump.contains("-99.9950000000"));
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.launched)),
        }

        // (E6 − E1) + (E4 − E2) 与 (E7 − E1) + (E5 − E3)
        let c = ReorgComponents::from_energies(&UNPHYSICAL);
        assert_relative_eq!(c.cation_hartree(), (0.01 - 0.015), epsilon = 1e-9);
        assert_relative_eq!(c.anion_hartree(), (0.02 - 0.015), epsilon = 1e-9);

        let summary =
            fs::read_to_string(dir.path().join("thiophene_ReorgEnergy_b3lyp_6-31gd.txt")).unwrap();
        assert!(summary.contains("UNPHYSICAL"));
    }

    #[test]
    fn test_negative_frequency_halts_cycle() {
        let (_dir, config) = setup(true);
        let mut engine = StubEngine::new(PHYSICAL);
        engine
            .frequencies
            .insert(1, vec![-12.3, 45.0, 78.0, 110.0]);

        let result = ReorgDriver::new(&engine, &config).run("thiophene");
        match result {
            Err(OscreenError::NotAMinimum { step, modes }) => {
                assert_eq!(step, "#1 (0 EG)");
                assert!(modes.contains("mode #1: -12.3000"));
                assert!(!modes.contains("mode #2"));
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.launched)),
        }
        assert_eq!(engine.calls.get(), 1);
        assert!(!config.workdir.join("thiophene_b3lyp_6-31gd.lock").exists());
    }

    #[test]
    fn test_rerun_reuses_outputs() {
        let (dir, config) = setup(false);
        let engine = StubEngine::new(PHYSICAL);
        let first = ReorgDriver::new(&engine, &config).run("thiophene").unwrap();
        let first_text = fs::read_to_string(&first.summary_path).unwrap();

        let again = StubEngine::new(PHYSICAL);
        let second = ReorgDriver::new(&again, &config).run("thiophene").unwrap();
        let second_text = fs::read_to_string(&second.summary_path).unwrap();

        assert_eq!(again.calls.get(), 0);
        assert_eq!(second.launched, 0);
        assert_eq!(second.reused, 7);
        assert_eq!(first_text, second_text);
        assert_eq!(
            first.summary.components.cation_mev().to_bits(),
            second.summary.components.cation_mev().to_bits()
        );
        drop(dir);
    }

    #[test]
    fn test_abnormal_log_is_rerun() {
        let (dir, config) = setup(false);
        let engine = StubEngine::new(PHYSICAL);
        let driver = ReorgDriver::new(&engine, &config);
        driver.run("thiophene").unwrap();

        let log = dir.path().join("thiophene_b3lyp_6-31gd_m0_SP.log");
        fs::write(&log, " Error termination via Lnk1e\n").unwrap();

        let again = StubEngine::new(PHYSICAL);
        let outcome = ReorgDriver::new(&again, &config).run("thiophene").unwrap();
        assert_eq!(again.calls.get(), 1);
        assert_eq!(*again.order.borrow(), vec![5]);
        assert_eq!(outcome.reused, 6);
    }

    #[test]
    fn test_existing_lock_blocks_cycle() {
        let (dir, config) = setup(false);
        let lock = dir.path().join("thiophene_b3lyp_6-31gd.lock");
        fs::write(&lock, "12345\n").unwrap();

        let engine = StubEngine::new(PHYSICAL);
        match ReorgDriver::new(&engine, &config).run("thiophene") {
            Err(OscreenError::Locked { .. }) => {}
            other => panic!("unexpected result: {:?}", other.map(|o| o.launched)),
        }
        assert_eq!(engine.calls.get(), 0);
        // 他人的锁不被删除
        assert!(lock.exists());
    }

    #[test]
    fn test_missing_source_geometry() {
        let dir = tempdir().unwrap();
        let config = ReorgConfig {
            functional: Functional::parse("b3lyp/cc-pvtz").unwrap(),
            workdir: dir.path().to_path_buf(),
            nproc: 1,
            mem: "1GB".to_string(),
            parallel: false,
        };
        let engine = StubEngine::new(PHYSICAL);
        assert!(matches!(
            ReorgDriver::new(&engine, &config).run("missing"),
            Err(OscreenError::FileNotFound { .. })
        ));
    }
}
