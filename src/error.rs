//! # 统一错误处理模块
//!
//! 定义 oscreen 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 输入格式错误：参数文件、几何文件、未知原子序数（单条记录致命）
//! - 计算引擎错误：未找到 `Normal termination`（单步致命，终止整个循环）
//! - 非极小点：EG 步骤存在虚频（单步致命，列出问题振动模式）
//! - 非物理 λ：λ₁ 或 λ₂ 为负（附带完整能量列表）
//! - 优化器失败：全局优化未收敛（记录标记失败，批处理继续）
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// oscreen 统一错误类型
#[derive(Error, Debug)]
pub enum OscreenError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 输入格式错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid dispersion parameter file {path} (line {line}): {reason}")]
    InvalidParameterFile {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Unknown atomic number: {0}")]
    UnknownAtomicNumber(u32),

    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Engine did not terminate normally: {path}")]
    AbnormalTermination { path: String },

    // ─────────────────────────────────────────────────────────────
    // 物理检查错误
    // ─────────────────────────────────────────────────────────────
    #[error("Geometry of step {step} is not a minimum, imaginary modes:\n{modes}")]
    NotAMinimum { step: String, modes: String },

    #[error("Unphysical reorganization energy ({component} < 0)\n{dump}")]
    UnphysicalReorganization { component: String, dump: String },

    #[error("Band-edge optimizer failed for {label}: {reason}")]
    OptimizerFailed { label: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 并发控制
    // ─────────────────────────────────────────────────────────────
    #[error("Work directory is locked by another run: {path}")]
    Locked { path: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, OscreenError>;

impl OscreenError {
    /// 包装读文件错误
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        OscreenError::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// 包装写文件错误
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        OscreenError::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}
