//! # reorg 命令实现
//!
//! 对一个或多个材料依次执行四点法重组能循环。
//!
//! ## 功能
//! - 选择本地或 Slurm 引擎
//! - 材料之间顺序执行，单个失败不影响后续材料
//! - 打印 λ(cation)/λ(anion) 与汇总文件路径
//! - 有任一循环失败时以非零状态退出
//!
//! ## 依赖关系
//! - 使用 `cli/reorg.rs` 定义的参数
//! - 使用 `reorg/` 驱动器与引擎
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/slurm.rs`

use crate::cli::reorg::ReorgArgs;
use crate::error::{OscreenError, Result};
use crate::reorg::engine::{DEFAULT_EXECUTABLE, LEGACY_EXECUTABLE};
use crate::reorg::{Engine, Functional, LocalEngine, ReorgConfig, ReorgDriver, SlurmEngine};
use crate::utils::slurm::SlurmConfig;
use crate::utils::{output, progress};

use std::time::Duration;

/// 执行 reorg 命令
pub fn execute(args: ReorgArgs) -> Result<()> {
    output::print_header("Reorganization Energy (four-point cycle)");

    if !args.workdir.is_dir() {
        return Err(OscreenError::DirectoryNotFound {
            path: args.workdir.display().to_string(),
        });
    }

    let config = ReorgConfig {
        functional: Functional::parse(&args.functional)?,
        workdir: args.workdir.clone(),
        nproc: args.nproc,
        mem: args.mem.clone(),
        parallel: args.parallel,
    };

    let engine = build_engine(&args);
    output::print_info(&format!(
        "{} material(s), {} via {}",
        args.materials.len(),
        config.functional.raw,
        engine.describe()
    ));

    let driver = ReorgDriver::new(engine.as_ref(), &config);
    let mut failed = Vec::new();

    for material in &args.materials {
        let spinner = progress::create_spinner(&format!("{}: running cycle", material));
        let result = driver.run(material);
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                output::print_success(&format!(
                    "{} ({} launched, {} reused)",
                    material, outcome.launched, outcome.reused
                ));
                let c = &outcome.summary.components;
                output::print_kv("lambda(cation)", &format!("{:.4} meV", c.cation_mev()));
                output::print_kv("lambda(anion)", &format!("{:.4} meV", c.anion_mev()));
                output::print_output("summary", &outcome.summary_path);
            }
            Err(e) => {
                output::print_error(&format!("{}: {}", material, e));
                failed.push(material.clone());
            }
        }
    }

    output::print_separator();
    if failed.is_empty() {
        output::print_done(&format!("{} cycle(s) completed", args.materials.len()));
        Ok(())
    } else {
        Err(OscreenError::Other(format!(
            "{} of {} cycle(s) failed: {}",
            failed.len(),
            args.materials.len(),
            failed.join(", ")
        )))
    }
}

/// 引擎可执行文件：显式指定优先，其次 `--legacy`
fn engine_executable(args: &ReorgArgs) -> String {
    match &args.gaussian {
        Some(exe) if !exe.trim().is_empty() => exe.trim().to_string(),
        _ if args.legacy => LEGACY_EXECUTABLE.to_string(),
        _ => DEFAULT_EXECUTABLE.to_string(),
    }
}

fn slurm_config(args: &ReorgArgs) -> SlurmConfig {
    SlurmConfig {
        partition: args.partition.clone(),
        ntasks: args.ntasks,
        cpus_per_task: args.nproc,
        mem_per_cpu: args.mem_per_cpu.clone(),
        time_limit: args.time.clone(),
        modules: args
            .modules
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect(),
        poll_interval: Duration::from_secs(args.poll_interval.max(1)),
        max_poll_interval: Duration::from_secs(args.max_poll_interval.max(args.poll_interval)),
        ..SlurmConfig::default()
    }
}

fn build_engine(args: &ReorgArgs) -> Box<dyn Engine> {
    let exe = engine_executable(args);
    if args.slurm {
        Box::new(SlurmEngine::new(exe, slurm_config(args)))
    } else {
        Box::new(LocalEngine::new(exe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(workdir: std::path::PathBuf) -> ReorgArgs {
        ReorgArgs {
            materials: vec!["thiophene".to_string(), "furan".to_string()],
            functional: "b3lyp/6-31g(d)".to_string(),
            workdir,
            parallel: false,
            gaussian: None,
            legacy: false,
            nproc: 8,
            mem: "8GB".to_string(),
            slurm: false,
            partition: "cpu".to_string(),
            time: "48:00:00".to_string(),
            ntasks: 1,
            mem_per_cpu: "2G".to_string(),
            modules: "gaussian/16, intel ".to_string(),
            poll_interval: 30,
            max_poll_interval: 300,
        }
    }

    #[test]
    fn test_engine_executable_precedence() {
        let mut a = args(".".into());
        assert_eq!(engine_executable(&a), "g16");
        a.legacy = true;
        assert_eq!(engine_executable(&a), "g09");
        a.gaussian = Some("/opt/g16/g16".to_string());
        assert_eq!(engine_executable(&a), "/opt/g16/g16");
    }

    #[test]
    fn test_slurm_config_from_args() {
        let config = slurm_config(&args(".".into()));
        assert_eq!(config.modules, vec!["gaussian/16", "intel"]);
        assert_eq!(config.cpus_per_task, 8);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.max_poll_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_failed_cycles_continue_and_report() {
        let dir = tempdir().unwrap();
        let err = execute(args(dir.path().to_path_buf())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 of 2"));
        assert!(msg.contains("thiophene, furan"));
    }

    #[test]
    fn test_missing_workdir() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            execute(args(dir.path().join("missing"))),
            Err(OscreenError::DirectoryNotFound { .. })
        ));
    }
}
