//! # 解析器模块
//!
//! 提供输入参数文件、计算引擎输入和输出格式的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/`、`reorg/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: elements, gaussian_log, gjf, ti_param

pub mod elements;
pub mod gaussian_log;
pub mod gjf;
pub mod ti_param;

use crate::error::{OscreenError, Result};
use crate::models::Molecule;
use std::path::{Path, PathBuf};

/// 在工作目录中查找材料的源几何 (`<material>.gjf` 或 `<material>.com`)
pub fn find_source_geometry(workdir: &Path, material: &str) -> Result<PathBuf> {
    ["gjf", "com"]
        .iter()
        .map(|ext| workdir.join(format!("{}.{}", material, ext)))
        .find(|p| p.exists())
        .ok_or_else(|| OscreenError::FileNotFound {
            path: workdir
                .join(format!("{}.gjf", material))
                .display()
                .to_string(),
        })
}

/// 读取材料的源几何
pub fn load_source_geometry(workdir: &Path, material: &str) -> Result<Molecule> {
    let path = find_source_geometry(workdir, material)?;
    let mut molecule = gjf::parse_gjf_file(&path)?;
    molecule.name = material.to_string();
    Ok(molecule)
}
