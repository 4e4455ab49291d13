//! # Gaussian 输出 (.log) 解析器
//!
//! 从计算引擎输出中提取：
//! - 正常结束标志 (`Normal termination`)
//! - 最终 SCF 能量（最后一个 `SCF Done` 行，`=` 与 `A.U. after` 之间的数值）
//! - 优化后的笛卡尔坐标（最后一个 `Standard orientation` 块）
//! - 振动频率（`Harmonic frequencies (cm**-1)` 之后所有 `Frequencies` 行）
//!
//! ## 坐标块格式
//! ```text
//!                          Standard orientation:
//!  ---------------------------------------------------------------------
//!  Center     Atomic      Atomic             Coordinates (Angstroms)
//!  Number     Number       Type             X           Y           Z
//!  ---------------------------------------------------------------------
//!       1          6           0        0.000000    1.400000    0.000000
//!  ---------------------------------------------------------------------
//! ```
//!
//! ## 依赖关系
//! - 被 `reorg/driver.rs` 使用
//! - 使用 `parsers/elements.rs` 将原子序数映射为元素符号

use crate::error::{OscreenError, Result};
use crate::models::{Atom, FrequencySet};
use crate::parsers::elements;

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const FREQ_HEADER: &str = "Harmonic frequencies (cm**-1)";

/// 坐标行: center, atomic number, atomic type, x, y, z
static ORIENTATION_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\s+(\d+)\s+-?\d+\s+(\S+)\s+(\S+)\s+(\S+)\s*$").expect("valid regex")
});

/// 解析后的引擎输出
#[derive(Debug, Clone)]
pub struct GaussianLog {
    pub normal_termination: bool,
    pub scf_energy: Option<f64>,
    pub geometry: Option<Vec<Atom>>,
    pub frequencies: FrequencySet,
}

/// 解析 Gaussian 输出文件
pub fn parse_log_file(path: &Path) -> Result<GaussianLog> {
    let content = fs::read_to_string(path).map_err(|e| OscreenError::read(path, e))?;
    parse_log_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 Gaussian 输出
pub fn parse_log_content(content: &str, source: &str) -> Result<GaussianLog> {
    let geometry = last_orientation(content, "Standard orientation", source)?;
    let geometry = match geometry {
        Some(atoms) => Some(atoms),
        // nosymm 时只有 Input orientation
        None => last_orientation(content, "Input orientation", source)?,
    };

    Ok(GaussianLog {
        normal_termination: is_normal_termination(content),
        scf_energy: last_scf_energy(content),
        geometry,
        frequencies: FrequencySet::new(frequencies(content)),
    })
}

/// 最后一个 termination 行是否为正常结束
pub fn is_normal_termination(content: &str) -> bool {
    content
        .lines()
        .rev()
        .find(|l| l.contains("termination"))
        .map(|l| l.contains("Normal termination"))
        .unwrap_or(false)
}

/// 最后一个 SCF Done 行中的能量 (Hartree)
///
/// `SCF Done:  E(RB3LYP) =  -552.123456789     A.U. after   14 cycles`
pub fn last_scf_energy(content: &str) -> Option<f64> {
    let line = content.lines().rev().find(|l| l.contains("SCF Done"))?;
    let start = line.find('=')? + 1;
    let end = line.find("A.U. after")?;
    if end <= start {
        return None;
    }
    line[start..end].trim().parse().ok()
}

/// 最后一个指定坐标块
fn last_orientation(content: &str, header: &str, source: &str) -> Result<Option<Vec<Atom>>> {
    let lines: Vec<&str> = content.lines().collect();
    let start = match lines.iter().rposition(|l| l.contains(header)) {
        Some(idx) => idx,
        None => return Ok(None),
    };

    let mut separators = 0;
    let mut atoms = Vec::new();

    for line in &lines[start + 1..] {
        if line.trim_start().starts_with("----") {
            separators += 1;
            if separators == 3 {
                break;
            }
            continue;
        }
        // 跳过两条分隔线之间的表头
        if separators < 2 {
            continue;
        }

        let caps = ORIENTATION_ROW
            .captures(line)
            .ok_or_else(|| OscreenError::ParseError {
                format: "gaussian log".to_string(),
                path: source.to_string(),
                reason: format!("malformed orientation row: '{}'", line.trim()),
            })?;

        let z: u32 = caps[1].parse().map_err(|_| OscreenError::ParseError {
            format: "gaussian log".to_string(),
            path: source.to_string(),
            reason: format!("invalid atomic number in '{}'", line.trim()),
        })?;

        let mut position = [0.0; 3];
        for (k, value) in position.iter_mut().enumerate() {
            *value = caps[k + 2].parse().map_err(|_| OscreenError::ParseError {
                format: "gaussian log".to_string(),
                path: source.to_string(),
                reason: format!("invalid coordinate in '{}'", line.trim()),
            })?;
        }

        atoms.push(Atom::new(elements::symbol(z)?, position));
    }

    if separators < 3 || atoms.is_empty() {
        return Err(OscreenError::ParseError {
            format: "gaussian log".to_string(),
            path: source.to_string(),
            reason: format!("truncated '{}' block", header),
        });
    }

    Ok(Some(atoms))
}

/// 振动频率列表 (cm⁻¹)
pub fn frequencies(content: &str) -> Vec<f64> {
    let section = match content.rfind(FREQ_HEADER) {
        Some(pos) => &content[pos + FREQ_HEADER.len()..],
        None => return Vec::new(),
    };

    section
        .lines()
        .filter(|l| l.trim_start().starts_with("Frequencies"))
        .flat_map(|l| l.split_whitespace().filter_map(|s| s.parse::<f64>().ok()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 生成最小 Gaussian 风格输出，供解析和驱动测试使用
    pub(crate) fn synthetic_log(energy: f64, atoms: &[Atom], freqs: Option<&[f64]>) -> String {
        let mut log = String::new();
        log.push_str(" Entering Gaussian System, Link 0=g16\n");
        log.push_str(" SCF Done:  E(RB3LYP) =  -1.00000000000     A.U. after    9 cycles\n");
        log.push_str("                         Standard orientation:\n");
        log.push_str(" ---------------------------------------------------------------------\n");
        log.push_str(" Center     Atomic      Atomic             Coordinates (Angstroms)\n");
        log.push_str(" Number     Number       Type             X           Y           Z\n");
        log.push_str(" ---------------------------------------------------------------------\n");
        for (i, atom) in atoms.iter().enumerate() {
            let z = elements::atomic_number(&atom.element).unwrap();
            log.push_str(&format!(
                " {:>6} {:>10} {:>11} {:>15.6}{:>12.6}{:>12.6}\n",
                i + 1,
                z,
                0,
                atom.position[0],
                atom.position[1],
                atom.position[2]
            ));
        }
        log.push_str(" ---------------------------------------------------------------------\n");
        log.push_str(&format!(
            " SCF Done:  E(UB3LYP) =  {:.10}     A.U. after   14 cycles\n",
            energy
        ));
        if let Some(freqs) = freqs {
            log.push_str(" Normal termination of Gaussian 16 at Mon Oct 19 10:00:00 2026.\n");
            log.push_str(
                " Harmonic frequencies (cm**-1), IR intensities (KM/Mole), Raman scattering\n",
            );
            for chunk in freqs.chunks(3) {
                log.push_str("                      1                      2                      3\n");
                log.push_str("                      A                      A                      A\n");
                let values: Vec<String> = chunk.iter().map(|f| format!("{:>10.4}", f)).collect();
                log.push_str(&format!(" Frequencies -- {}\n", values.join("             ")));
                log.push_str(" Red. masses --     1.0000                 1.0000                 1.0000\n");
            }
        }
        log.push_str(" Normal termination of Gaussian 16 at Mon Oct 19 10:05:00 2026.\n");
        log
    }

    fn benzene_fragment() -> Vec<Atom> {
        vec![
            Atom::new("C", [0.0, 1.396, 0.0]),
            Atom::new("C", [1.209, 0.698, 0.0]),
            Atom::new("H", [0.0, 2.479, 0.0]),
        ]
    }

    #[test]
    fn test_parse_log_energy_and_geometry() {
        let log = synthetic_log(-232.2486531234, &benzene_fragment(), None);
        let parsed = parse_log_content(&log, "benzene.log").unwrap();

        assert!(parsed.normal_termination);
        assert_eq!(parsed.scf_energy, Some(-232.2486531234));

        let geom = parsed.geometry.unwrap();
        assert_eq!(geom.len(), 3);
        assert_eq!(geom[0].element, "C");
        assert_eq!(geom[2].element, "H");
        assert!((geom[1].position[0] - 1.209).abs() < 1e-12);
        assert!(parsed.frequencies.values.is_empty());
    }

    #[test]
    fn test_parse_log_frequencies() {
        let freqs = [-12.3, 45.0, 78.0, 120.5];
        let log = synthetic_log(-100.0, &benzene_fragment(), Some(&freqs));
        let parsed = parse_log_content(&log, "freq.log").unwrap();
        assert_eq!(parsed.frequencies.values, freqs.to_vec());
        assert_eq!(parsed.frequencies.imaginary_modes(), vec![(1, -12.3)]);
    }

    #[test]
    fn test_termination_detection() {
        assert!(is_normal_termination(" Normal termination of Gaussian 16\n"));
        assert!(!is_normal_termination(
            " Normal termination of Gaussian 16\n Error termination via Lnk1e\n"
        ));
        assert!(!is_normal_termination(" SCF Done: E(RHF) = -1.0 A.U. after 3 cycles\n"));
    }

    #[test]
    fn test_last_scf_energy_takes_final_occurrence() {
        let content = " SCF Done:  E(RB3LYP) =  -10.5     A.U. after   3 cycles\n\
                       SCF Done:  E(RB3LYP) =  -10.75    A.U. after   2 cycles\n";
        assert_eq!(last_scf_energy(content), Some(-10.75));
        assert_eq!(last_scf_energy("no energy here"), None);
    }

    #[test]
    fn test_unknown_atomic_number() {
        let content = "                         Standard orientation:\n\
 ---------------------------------------------------------------------\n\
 Center     Atomic      Atomic             Coordinates (Angstroms)\n\
 Number     Number       Type             X           Y           Z\n\
 ---------------------------------------------------------------------\n\
      1        120           0        0.000000    0.000000    0.000000\n\
 ---------------------------------------------------------------------\n";
        match parse_log_content(content, "bad.log") {
            Err(OscreenError::UnknownAtomicNumber(120)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
