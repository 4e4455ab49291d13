//! # 计算引擎抽象
//!
//! 驱动器通过 `Engine` trait 调用外部量子化学程序。引擎只负责运行，
//! 输出的正确性由驱动器解析 `.log` 后检查。
//!
//! ## 实现
//! - `LocalEngine`: 在工作目录中直接运行 `<exe> <input.gjf>` 并等待子进程，
//!   标准错误写入 `<name>.stderr`
//! - `SlurmEngine`: 生成 sbatch 脚本提交，轮询 `squeue` 直到作业离开队列
//!
//! ## 依赖关系
//! - 被 `reorg/driver.rs` 使用
//! - 使用 `utils/slurm.rs`

use crate::error::{OscreenError, Result};
use crate::models::Step;
use crate::utils::slurm::{self, SlurmConfig};

use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// 引擎默认可执行文件
pub const DEFAULT_EXECUTABLE: &str = "g16";
/// `--legacy` 使用的可执行文件
pub const LEGACY_EXECUTABLE: &str = "g09";

/// 单步作业描述
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub step: Step,
    /// 作业名（输入文件主干）
    pub name: String,
    pub workdir: PathBuf,
    pub input: PathBuf,
    pub log: PathBuf,
}

/// 已提交作业的句柄
#[derive(Debug)]
pub enum JobHandle {
    /// 本地子进程
    Local(Child),
    /// 批处理系统作业号
    Queued(String),
    /// 已同步完成
    Finished,
}

/// 外部计算引擎
pub trait Engine {
    /// 引擎描述，用于日志
    fn describe(&self) -> String;

    /// 启动作业，不等待完成
    fn submit(&self, job: &EngineJob) -> Result<JobHandle>;

    /// 阻塞直到作业结束
    fn wait(&self, job: &EngineJob, handle: JobHandle) -> Result<()>;

    /// 启动并等待
    fn run(&self, job: &EngineJob) -> Result<()> {
        let handle = self.submit(job)?;
        self.wait(job, handle)
    }
}

/// 本地子进程引擎
#[derive(Debug, Clone)]
pub struct LocalEngine {
    pub executable: String,
}

impl LocalEngine {
    pub fn new(executable: impl Into<String>) -> Self {
        LocalEngine {
            executable: executable.into(),
        }
    }
}

impl Engine for LocalEngine {
    fn describe(&self) -> String {
        format!("local '{}'", self.executable)
    }

    fn submit(&self, job: &EngineJob) -> Result<JobHandle> {
        let input_name = input_file_name(job);
        log::debug!(
            "spawning '{} {}' in {}",
            self.executable,
            input_name,
            job.workdir.display()
        );

        // 并行等待期间无人读取，不能用管道
        let stderr_path = stderr_path(job);
        let stderr =
            fs::File::create(&stderr_path).map_err(|e| OscreenError::write(&stderr_path, e))?;

        let child = Command::new(&self.executable)
            .arg(&input_name)
            .current_dir(&job.workdir)
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OscreenError::CommandNotFound {
                    command: self.executable.clone(),
                },
                _ => OscreenError::CommandFailed {
                    command: format!("{} {}", self.executable, input_name),
                    stderr: e.to_string(),
                },
            })?;

        Ok(JobHandle::Local(child))
    }

    fn wait(&self, job: &EngineJob, handle: JobHandle) -> Result<()> {
        let mut child = match handle {
            JobHandle::Local(child) => child,
            _ => return Ok(()),
        };

        let status = child.wait().map_err(|e| OscreenError::CommandFailed {
            command: format!("{} {}", self.executable, input_file_name(job)),
            stderr: e.to_string(),
        })?;

        // 非零退出码时是否成功由输出文件判定
        if !status.success() {
            log::debug!(
                "{} exited with {} for {}, see {}",
                self.executable,
                status,
                job.step,
                stderr_path(job).display()
            );
        }
        Ok(())
    }
}

/// Slurm 批处理引擎
#[derive(Debug, Clone)]
pub struct SlurmEngine {
    pub executable: String,
    pub config: SlurmConfig,
}

impl SlurmEngine {
    pub fn new(executable: impl Into<String>, config: SlurmConfig) -> Self {
        SlurmEngine {
            executable: executable.into(),
            config,
        }
    }
}

impl Engine for SlurmEngine {
    fn describe(&self) -> String {
        format!(
            "slurm '{}' (partition {})",
            self.executable, self.config.partition
        )
    }

    fn submit(&self, job: &EngineJob) -> Result<JobHandle> {
        let config = SlurmConfig {
            job_name: job.name.clone(),
            ..self.config.clone()
        };

        let logs_dir = job.workdir.join("slurm_logs");
        fs::create_dir_all(&logs_dir).map_err(|e| OscreenError::write(&logs_dir, e))?;

        let exec_cmd = format!("{} \"{}\"", self.executable, input_file_name(job));
        let script = slurm::generate_sbatch_script(&config, &job.workdir, &exec_cmd);
        let script_path = job.workdir.join(format!("{}.sbatch", job.name));
        fs::write(&script_path, script).map_err(|e| OscreenError::write(&script_path, e))?;

        let job_id = slurm::submit_script(&script_path, &job.workdir)?;
        log::debug!("submitted {} as slurm job {}", job.step, job_id);
        Ok(JobHandle::Queued(job_id))
    }

    fn wait(&self, _job: &EngineJob, handle: JobHandle) -> Result<()> {
        match handle {
            JobHandle::Queued(id) => slurm::wait_for_job(&id, &self.config),
            JobHandle::Local(_) | JobHandle::Finished => Ok(()),
        }
    }
}

fn stderr_path(job: &EngineJob) -> PathBuf {
    job.workdir.join(format!("{}.stderr", job.name))
}

fn input_file_name(job: &EngineJob) -> String {
    job.input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| job.input.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalcKind, Charge};
    use tempfile::tempdir;

    fn job(dir: &std::path::Path) -> EngineJob {
        EngineJob {
            step: Step {
                index: 1,
                charge: Charge::Neutral,
                kind: CalcKind::Eg,
            },
            name: "mol_b3lyp_0_EG".to_string(),
            workdir: dir.to_path_buf(),
            input: dir.join("mol_b3lyp_0_EG.gjf"),
            log: dir.join("mol_b3lyp_0_EG.log"),
        }
    }

    #[test]
    fn test_local_engine_missing_executable() {
        let dir = tempdir().unwrap();
        let engine = LocalEngine::new("oscreen-no-such-engine-binary");
        match engine.submit(&job(dir.path())) {
            Err(OscreenError::CommandNotFound { command }) => {
                assert_eq!(command, "oscreen-no-such-engine-binary")
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_local_engine_chatty_stderr_goes_to_file() {
        let dir = tempdir().unwrap();
        let first = job(dir.path());
        let second = EngineJob {
            name: "mol_b3lyp_p1_EG".to_string(),
            input: dir.path().join("mol_b3lyp_p1_EG.gjf"),
            log: dir.path().join("mol_b3lyp_p1_EG.log"),
            ..first.clone()
        };
        // 远超管道缓冲区的标准错误输出
        for j in [&first, &second] {
            let script = format!(
                "i=0\n\
                 while [ $i -lt 4000 ]; do echo 'warning: noisy engine output' >&2; i=$((i+1)); done\n\
                 echo done > {}.log\n",
                j.name
            );
            fs::write(&j.input, script).unwrap();
        }

        let engine = LocalEngine::new("sh");
        let h1 = engine.submit(&first).unwrap();
        let h2 = engine.submit(&second).unwrap();
        engine.wait(&second, h2).unwrap();
        engine.wait(&first, h1).unwrap();

        for j in [&first, &second] {
            assert!(j.log.exists());
            let stderr = fs::read_to_string(stderr_path(j)).unwrap();
            assert_eq!(stderr.lines().count(), 4000);
        }
    }

    #[test]
    fn test_input_file_name() {
        let dir = tempdir().unwrap();
        assert_eq!(input_file_name(&job(dir.path())), "mol_b3lyp_0_EG.gjf");
    }
}
