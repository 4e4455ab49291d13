//! # 能带结果导出
//!
//! ## 输出文件
//! - `<label>_band.txt`: 高对称路径 `x  E+  E−`
//! - `<label>_surface.txt`: 第一象限能带面 `kc kt E+ E−`
//! - `<label>_effmass.txt`: 单个材料的能带边与有效质量
//! - `effective_masses.csv`: 批处理汇总
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `band/path.rs`, `band/surface.rs`
//! - 使用 `csv` + `serde` 写入汇总表

use crate::band::path::BandPath;
use crate::band::surface::BandSurface;
use crate::error::{OscreenError, Result};
use crate::models::{BandKind, DispersionInput, EdgeFailure, EdgeSearch, EffectiveMass};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 单个材料的输出路径
#[derive(Debug, Clone)]
pub struct BandOutputs {
    pub band: PathBuf,
    pub surface: PathBuf,
    pub effmass: PathBuf,
    pub plot: PathBuf,
}

impl BandOutputs {
    pub fn new(output_dir: &Path, label: &str) -> Self {
        BandOutputs {
            band: output_dir.join(format!("{}_band.txt", label)),
            surface: output_dir.join(format!("{}_surface.txt", label)),
            effmass: output_dir.join(format!("{}_effmass.txt", label)),
            plot: output_dir.join(format!("{}_band.png", label)),
        }
    }

    /// 主要输出是否已存在
    pub fn exist(&self) -> bool {
        self.band.exists() && self.effmass.exists()
    }
}

/// 汇总表中的一行
#[derive(Debug, Clone, Serialize)]
pub struct MassRecord {
    pub label: String,
    pub band: String,
    pub kc: Option<f64>,
    pub kt: Option<f64>,
    pub edge_mev: Option<f64>,
    pub m1: Option<f64>,
    pub m2: Option<f64>,
    pub axis_deg: Option<f64>,
    pub provenance: String,
    /// 失败原因，不写入 CSV
    #[serde(skip)]
    pub failure: Option<EdgeFailure>,
}

impl MassRecord {
    /// 成功记录
    pub fn success(input: &DispersionInput, search: &EdgeSearch, mass: &EffectiveMass) -> Self {
        MassRecord {
            label: input.label.clone(),
            band: input.kind.to_string(),
            kc: Some(search.edge.kc),
            kt: Some(search.edge.kt),
            edge_mev: Some(search.edge.energy),
            m1: Some(mass.m1),
            m2: Some(mass.m2),
            axis_deg: mass.axis_angle,
            provenance: mass.provenance.to_string(),
            failure: None,
        }
    }

    /// 优化器失败，跳过有效质量
    pub fn failed(label: &str, kind: Option<BandKind>, failure: Option<EdgeFailure>) -> Self {
        MassRecord {
            label: label.to_string(),
            band: kind.map(|k| k.to_string()).unwrap_or_default(),
            kc: None,
            kt: None,
            edge_mev: None,
            m1: None,
            m2: None,
            axis_deg: None,
            provenance: "failed".to_string(),
            failure,
        }
    }
}

/// 写文本文件
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| OscreenError::write(path, e))
}

/// 导出路径采样
pub fn write_band_path(path: &BandPath, output_path: &Path) -> Result<()> {
    write_text(output_path, &path.to_text())
}

/// 导出能带面
pub fn write_surface(surface: &BandSurface, output_path: &Path) -> Result<()> {
    write_text(output_path, &surface.to_text())
}

/// 单个材料的有效质量报告
pub fn effmass_report(input: &DispersionInput, search: &EdgeSearch, mass: &EffectiveMass) -> String {
    let mut out = String::new();
    out.push_str(&format!("label        {}\n", input.label));
    out.push_str(&format!("band         {}\n", input.kind));
    out.push_str(&format!("a, b (A)     {:.6} {:.6}\n", input.a, input.b));
    out.push_str(&format!(
        "T (meV)      {:.4} {:.4} {:.4} {:.4} {:.4}\n",
        input.t.t12, input.t.t13, input.t.t23, input.t.t34, input.t.t35
    ));
    out.push_str(&format!(
        "edge         kc = {:.8} 1/A  kt = {:.8} 1/A  E = {:.6} meV\n",
        search.edge.kc, search.edge.kt, search.edge.energy
    ));
    out.push_str(&format!(
        "optimizer    {} generations, {} evaluations\n",
        search.generations, search.evaluations
    ));
    out.push_str(&format!(
        "Hessian      cc = {:.6} tt = {:.6} ct = {:.6} meV*A^2\n",
        mass.tensor.cc, mass.tensor.tt, mass.tensor.ct
    ));
    out.push_str(&format!("m1 (m_e)     {:.6}\n", mass.m1));
    out.push_str(&format!("m2 (m_e)     {:.6}\n", mass.m2));
    match mass.axis_angle {
        Some(angle) => out.push_str(&format!("axis (deg)   {:.3}\n", angle)),
        None => out.push_str("axis (deg)   -\n"),
    }
    out.push_str(&format!("provenance   {}\n", mass.provenance));
    out
}

/// 导出有效质量报告
pub fn write_effmass(
    input: &DispersionInput,
    search: &EdgeSearch,
    mass: &EffectiveMass,
    output_path: &Path,
) -> Result<()> {
    write_text(output_path, &effmass_report(input, search, mass))
}

/// 导出批处理汇总 CSV（按标签排序）
pub fn write_mass_csv(records: &[MassRecord], output_path: &Path) -> Result<()> {
    let mut sorted: Vec<&MassRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.label.cmp(&b.label));

    let mut wtr = csv::Writer::from_path(output_path)?;
    for record in sorted {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|e| OscreenError::write(output_path, e))?;

    Ok(())
}
