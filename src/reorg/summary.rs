//! # 重组能汇总文件
//!
//! 写出 `<material>_ReorgEnergy_<functional-tag>.txt`，内容包括：
//! 时间戳、材料、泛函、λ(anion)、λ(cation)、七步能量表、四个 λ₁/λ₂ 分量 (Hartree)
//! 以及每个 EG 步骤的最小频率。
//!
//! 时间戳取七个输出文件中最新的修改时间 (UTC)，复用输出重跑时内容逐字节相同。
//!
//! ## 依赖关系
//! - 被 `reorg/driver.rs` 调用
//! - 使用 `tabled` 渲染能量表

use crate::error::{OscreenError, Result};
use crate::models::{EnergyRecord, ReorgComponents, Step};

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// 汇总内容
#[derive(Debug, Clone)]
pub struct ReorgSummary {
    pub timestamp: String,
    pub material: String,
    pub functional: String,
    pub records: Vec<EnergyRecord>,
    pub components: ReorgComponents,
    pub min_frequencies: Vec<(Step, Option<f64>)>,
}

#[derive(Tabled)]
struct EnergyRow {
    #[tabled(rename = "Step")]
    index: usize,
    #[tabled(rename = "Charge")]
    charge: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Energy (Hartree)")]
    energy: String,
}

impl ReorgSummary {
    /// 汇总文件名
    pub fn file_name(material: &str, functional_tag: &str) -> String {
        format!("{}_ReorgEnergy_{}.txt", material, functional_tag)
    }

    /// 渲染为文本
    pub fn render(&self) -> String {
        let c = &self.components;
        let mut out = String::new();

        out.push_str(&format!("Timestamp       : {}\n", self.timestamp));
        out.push_str(&format!("Material        : {}\n", self.material));
        out.push_str(&format!("Functional      : {}\n", self.functional));
        out.push_str(&format!("lambda(anion)   : {:.4} meV\n", c.anion_mev()));
        out.push_str(&format!("lambda(cation)  : {:.4} meV\n", c.cation_mev()));
        if let Some(name) = c.negative_component() {
            out.push_str(&format!("UNPHYSICAL      : {} < 0\n", name));
        }
        out.push('\n');

        let rows: Vec<EnergyRow> = self
            .records
            .iter()
            .map(|r| EnergyRow {
                index: r.step.index,
                charge: r.step.charge.to_string(),
                kind: r.step.kind.to_string(),
                energy: format!("{:.10}", r.energy),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::ascii());
        out.push_str(&table.to_string());
        out.push_str("\n\n");

        out.push_str("Components (Hartree)\n");
        out.push_str(&format!("lambda1(cation) = E(+0 SP) - E(0 EG)  = {:.10}\n", c.cation_l1));
        out.push_str(&format!("lambda2(cation) = E(+1 SP) - E(+1 EG) = {:.10}\n", c.cation_l2));
        out.push_str(&format!("lambda1(anion)  = E(-0 SP) - E(0 EG)  = {:.10}\n", c.anion_l1));
        out.push_str(&format!("lambda2(anion)  = E(-1 SP) - E(-1 EG) = {:.10}\n", c.anion_l2));
        out.push('\n');

        out.push_str("Minimum frequency (cm^-1)\n");
        for (step, freq) in &self.min_frequencies {
            match freq {
                Some(f) => out.push_str(&format!("{:<12} {:.4}\n", step.to_string(), f)),
                None => out.push_str(&format!("{:<12} -\n", step.to_string())),
            }
        }

        out
    }

    /// 写入工作目录
    pub fn write(&self, workdir: &Path, functional_tag: &str) -> Result<std::path::PathBuf> {
        let path = workdir.join(Self::file_name(&self.material, functional_tag));
        fs::write(&path, self.render()).map_err(|e| OscreenError::write(&path, e))?;
        Ok(path)
    }
}

/// 若干文件中最新的修改时间（Unix 秒）
pub fn newest_mtime(paths: &[&Path]) -> Result<u64> {
    let mut newest = 0;
    for path in paths {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| OscreenError::read(path, e))?;
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        newest = newest.max(secs);
    }
    Ok(newest)
}

/// Unix 秒 → `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_utc(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// 1970-01-01 起的天数 → 公历日期 (Howard Hinnant 算法)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
