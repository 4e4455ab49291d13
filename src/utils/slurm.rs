//! # Slurm 作业工具
//!
//! 生成 Gaussian 作业的 sbatch 脚本，提交作业并查询队列状态。
//!
//! ## 轮询策略
//! 首次间隔 `poll_interval`（默认 30 s），每次翻倍，上限 `max_poll_interval`（默认 300 s）。
//!
//! ## 依赖关系
//! - 被 `reorg/engine.rs` 的 SlurmEngine 使用
//! - 调用外部命令 `sbatch`, `squeue`

use crate::error::{OscreenError, Result};

use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

static SUBMITTED_JOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Submitted batch job\s+(\d+)").expect("valid regex"));

/// Slurm 作业配置
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    pub job_name: String,
    pub partition: String,
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub mem_per_cpu: String,
    pub time_limit: String,
    pub modules: Vec<String>,
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        SlurmConfig {
            job_name: "job".to_string(),
            partition: "cpu".to_string(),
            ntasks: 1,
            cpus_per_task: 16,
            mem_per_cpu: "2G".to_string(),
            time_limit: "48:00:00".to_string(),
            modules: vec![],
            poll_interval: Duration::from_secs(30),
            max_poll_interval: Duration::from_secs(300),
        }
    }
}

/// 生成 sbatch 脚本内容
pub fn generate_sbatch_script(config: &SlurmConfig, workdir: &Path, exec_cmd: &str) -> String {
    let module_loads = config
        .modules
        .iter()
        .map(|m| format!("module load {}", m))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"#!/bin/bash
#SBATCH --partition {}
#SBATCH --nodes=1
#SBATCH --mem-per-cpu {}
#SBATCH --time {}
#SBATCH -c {}
#SBATCH -n {}
#SBATCH -J {}
#SBATCH -o slurm_logs/%x.out
#SBATCH -e slurm_logs/%x.err

set -euo pipefail

module purge 2>&1
{}

cd "{}"
echo "Running: {}"
{}

sacct -o JobID,Submit,Start,End,CPUTime,State -j $SLURM_JOBID
"#,
        config.partition,
        config.mem_per_cpu,
        config.time_limit,
        config.cpus_per_task,
        config.ntasks,
        config.job_name,
        module_loads,
        workdir.display(),
        exec_cmd,
        exec_cmd,
    )
}

/// 从 sbatch 输出中提取作业号
pub fn parse_job_id(stdout: &str) -> Option<String> {
    SUBMITTED_JOB
        .captures(stdout)
        .map(|caps| caps[1].to_string())
}

/// 提交 sbatch 脚本，返回作业号
pub fn submit_script(script: &Path, workdir: &Path) -> Result<String> {
    let output = Command::new("sbatch")
        .arg(script)
        .current_dir(workdir)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OscreenError::CommandNotFound {
                command: "sbatch".to_string(),
            },
            _ => OscreenError::CommandFailed {
                command: "sbatch".to_string(),
                stderr: e.to_string(),
            },
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        return Err(OscreenError::CommandFailed {
            command: format!("sbatch {}", script.display()),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    parse_job_id(&stdout).ok_or_else(|| OscreenError::CommandFailed {
        command: format!("sbatch {}", script.display()),
        stderr: format!("unexpected sbatch output: '{}'", stdout.trim()),
    })
}

/// 作业是否仍在队列中（排队或运行）
pub fn job_in_queue(job_id: &str) -> Result<bool> {
    let output = Command::new("squeue")
        .args(["-h", "-j", job_id])
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OscreenError::CommandNotFound {
                command: "squeue".to_string(),
            },
            _ => OscreenError::CommandFailed {
                command: "squeue".to_string(),
                stderr: e.to_string(),
            },
        })?;

    // 作业离开队列后 squeue 可能报 "Invalid job id"
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("Invalid job id") {
            return Ok(false);
        }
        return Err(OscreenError::CommandFailed {
            command: format!("squeue -h -j {}", job_id),
            stderr: stderr.to_string(),
        });
    }

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// 指数退避的轮询间隔
#[derive(Debug, Clone)]
pub struct PollSchedule {
    current: Duration,
    max: Duration,
}

impl PollSchedule {
    pub fn new(initial: Duration, max: Duration) -> Self {
        PollSchedule {
            current: initial.min(max),
            max,
        }
    }

    /// 返回本次等待时长，并将下次间隔翻倍
    pub fn next_interval(&mut self) -> Duration {
        let interval = self.current;
        self.current = (self.current * 2).min(self.max);
        interval
    }
}

/// 阻塞直到作业离开队列
pub fn wait_for_job(job_id: &str, config: &SlurmConfig) -> Result<()> {
    let mut schedule = PollSchedule::new(config.poll_interval, config.max_poll_interval);
    while job_in_queue(job_id)? {
        let interval = schedule.next_interval();
        log::debug!("job {} still queued, next poll in {:?}", job_id, interval);
        std::thread::sleep(interval);
    }
    log::debug!("job {} left the queue", job_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_schedule_backoff() {
        let mut schedule = PollSchedule::new(Duration::from_secs(30), Duration::from_secs(300));
        let secs: Vec<u64> = (0..6).map(|_| schedule.next_interval().as_secs()).collect();
        assert_eq!(secs, vec![30, 60, 120, 240, 300, 300]);
    }

    #[test]
    fn test_parse_job_id() {
        assert_eq!(
            parse_job_id("Submitted batch job 123456\n"),
            Some("123456".to_string())
        );
        assert_eq!(parse_job_id("sbatch: error: invalid partition"), None);
    }

    #[test]
    fn test_sbatch_script_contents() {
        let config = SlurmConfig {
            job_name: "pentacene_0_EG".to_string(),
            modules: vec!["gaussian/16".to_string()],
            ..SlurmConfig::default()
        };
        let script = generate_sbatch_script(&config, Path::new("/scratch/run"), "g16 in.gjf");
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH -J pentacene_0_EG"));
        assert!(script.contains("module load gaussian/16"));
        assert!(script.contains("cd \"/scratch/run\""));
        assert!(script.contains("\ng16 in.gjf\n"));
    }
}
