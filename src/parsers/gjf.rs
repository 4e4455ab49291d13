//! # Gaussian 输入文件 (.gjf/.com) 读写
//!
//! 读取源几何（坐标 + 连接性块），并生成计算引擎输入文件。
//!
//! ## 输入文件结构
//! ```text
//! %nprocshared=16          # Link 0 资源指令
//! %mem=32GB
//! %chk=name.chk
//! # opt freq b3lyp/6-31g(d) geom=connectivity
//!
//! title
//!
//! 0 1                      # 电荷 自旋多重度
//!  C        0.0000000000   1.2000000000   0.0000000000
//! ...
//!
//!  1 2 1.5 3 1.0           # 连接性块（仅当路由行要求 connectivity）
//! ...
//!
//! 1 2 F                    # 附加输入段（原样复制到文件末尾）
//!
//! ```
//!
//! ## 依赖关系
//! - 被 `reorg/driver.rs` 使用
//! - 使用 `models/molecule.rs`, `parsers/elements.rs`

use crate::error::{OscreenError, Result};
use crate::models::{Atom, Molecule};
use crate::parsers::elements;

use std::fs;
use std::path::Path;

/// 引擎输入描述
#[derive(Debug, Clone)]
pub struct EngineInput<'a> {
    /// Link 0 指令（不含 `%`）
    pub link0: Vec<String>,
    /// 路由行（以 `#` 开头）
    pub route: String,
    pub title: String,
    pub charge: i32,
    pub multiplicity: u32,
    pub molecule: &'a Molecule,
}

/// 读取 .gjf/.com 文件中的几何与连接性
pub fn parse_gjf_file(path: &Path) -> Result<Molecule> {
    let content = fs::read_to_string(path).map_err(|e| OscreenError::read(path, e))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    parse_gjf_content(&content, name)
}

/// 从字符串内容解析 .gjf
pub fn parse_gjf_content(content: &str, name: &str) -> Result<Molecule> {
    let parse_error = |reason: &str| OscreenError::ParseError {
        format: "gjf".to_string(),
        path: name.to_string(),
        reason: reason.to_string(),
    };

    let mut lines = content.lines().map(str::trim_end).peekable();

    // Link 0 与空行
    while let Some(line) = lines.peek() {
        if line.trim_start().starts_with('%') || line.trim().is_empty() {
            lines.next();
        } else {
            break;
        }
    }

    // 路由段：直到空行
    match lines.peek() {
        Some(line) if line.trim_start().starts_with('#') => {}
        _ => return Err(parse_error("missing route section")),
    }
    let mut route = String::new();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        route.push_str(line);
        route.push(' ');
    }
    let wants_connectivity = route.to_lowercase().contains("connectivity");

    // 标题段：直到空行
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
    }

    // 电荷与自旋
    let charge_line = lines
        .next()
        .ok_or_else(|| parse_error("missing charge/multiplicity line"))?;
    let cs: Vec<i32> = charge_line
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if cs.len() < 2 {
        return Err(parse_error("invalid charge/multiplicity line"));
    }

    // 原子坐标：直到空行
    let mut atoms = Vec::new();
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        atoms.push(parse_atom_line(line).map_err(|e| parse_error(&e.to_string()))?);
    }
    if atoms.is_empty() {
        return Err(parse_error("no atoms in coordinate block"));
    }

    // 连接性块直到下一个空行，其余为附加输入段
    let rest: Vec<&str> = lines.collect();
    let split = if wants_connectivity {
        rest.iter().take_while(|l| !l.trim().is_empty()).count()
    } else {
        0
    };
    let (connectivity, trailing) = rest.split_at(split);

    let mut molecule = Molecule::new(name, atoms);
    molecule.connectivity = connectivity.join("\n");
    molecule.trailing = trim_blank_lines(trailing).join("\n");
    Ok(molecule)
}

fn trim_blank_lines<'a, 'b>(lines: &'b [&'a str]) -> &'b [&'a str] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);
    &lines[start..end]
}

/// 解析单行原子坐标
///
/// 元素字段可以是 `C`、`C-CA--0.1`、`C(Fragment=1)` 或原子序数；
/// 坐标取行末三个数值（兼容冻结标记列）。
fn parse_atom_line(line: &str) -> Result<Atom> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let first = tokens
        .first()
        .ok_or_else(|| OscreenError::InvalidArgument("empty atom line".to_string()))?;

    let element = if let Ok(z) = first.parse::<u32>() {
        elements::symbol(z)?
    } else {
        let symbol: String = first
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        elements::normalize_symbol(&symbol)?
    };

    let numbers: Vec<f64> = tokens[1..]
        .iter()
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();
    if numbers.len() < 3 {
        return Err(OscreenError::InvalidArgument(format!(
            "atom line needs three coordinates: '{}'",
            line.trim()
        )));
    }
    let n = numbers.len();

    Ok(Atom::new(
        element,
        [numbers[n - 3], numbers[n - 2], numbers[n - 1]],
    ))
}

/// 单行坐标：每个分量右对齐 15 列，10 位小数
pub fn format_atom_line(atom: &Atom) -> String {
    format!(
        " {:<2}{:>15.10}{:>15.10}{:>15.10}",
        atom.element, atom.position[0], atom.position[1], atom.position[2]
    )
}

/// 坐标块
pub fn to_coordinate_block(molecule: &Molecule) -> String {
    molecule
        .atoms
        .iter()
        .map(format_atom_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 生成引擎输入文件内容
pub fn to_gjf_string(input: &EngineInput) -> String {
    let mut result = String::new();

    for directive in &input.link0 {
        result.push_str(&format!("%{}\n", directive));
    }
    result.push_str(&input.route);
    result.push_str("\n\n");
    result.push_str(&input.title);
    result.push_str("\n\n");
    result.push_str(&format!("{} {}\n", input.charge, input.multiplicity));
    result.push_str(&to_coordinate_block(input.molecule));
    result.push_str("\n\n");

    if !input.molecule.connectivity.is_empty() {
        result.push_str(&input.molecule.connectivity);
        result.push_str("\n\n");
    }
    if !input.molecule.trailing.is_empty() {
        result.push_str(&input.molecule.trailing);
        result.push_str("\n\n");
    }

    result
}

/// 写出引擎输入文件
pub fn write_gjf_file(input: &EngineInput, path: &Path) -> Result<()> {
    fs::write(path, to_gjf_string(input)).map_err(|e| OscreenError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THIOPHENE: &str = r#"%nprocshared=8
%mem=8GB
%chk=thiophene.chk
# opt b3lyp/6-31g(d) geom=connectivity

thiophene source geometry

0 1
 S                  0.00000000    1.18820000    0.00000000
 C                  1.23430000    0.00000000    0.00000000
 C-CA--0.1         -1.23430000    0.00000000    0.00000000
 6                  0.71000000   -1.27000000    0.00000000
 C(Fragment=1) 0   -0.71000000   -1.27000000    0.00000000
 H                  2.26000000    0.33000000    0.00000000

 1 2 1.5 3 1.5
 2 4 1.5 6 1.0
 3 5 1.5
 4 5 1.5
 5
 6

"#;

    #[test]
    fn test_parse_gjf_basic() {
        let mol = parse_gjf_content(THIOPHENE, "thiophene").unwrap();
        assert_eq!(mol.num_atoms(), 6);
        assert_eq!(mol.atoms[0].element, "S");
        assert_eq!(mol.atoms[2].element, "C");
        assert_eq!(mol.atoms[3].element, "C");
        assert_eq!(mol.atoms[4].element, "C");
        assert_eq!(mol.atoms[4].position, [-0.71, -1.27, 0.0]);
        assert_eq!(mol.connectivity.lines().count(), 6);
        assert!(mol.connectivity.starts_with(" 1 2 1.5 3 1.5"));
    }

    #[test]
    fn test_format_atom_line_columns() {
        let line = format_atom_line(&Atom::new("C", [1.5, -0.25, 12.0]));
        assert_eq!(line, " C    1.5000000000  -0.2500000000  12.0000000000");
        // 元素字段 3 列 + 3 × 15 列
        assert_eq!(line.len(), 3 + 45);
    }

    #[test]
    fn test_gjf_round_trip() {
        let mol = parse_gjf_content(THIOPHENE, "thiophene").unwrap();
        let input = EngineInput {
            link0: vec!["nprocshared=4".to_string(), "mem=4GB".to_string()],
            route: "# b3lyp/6-31g(d) geom=connectivity".to_string(),
            title: "round trip".to_string(),
            charge: 1,
            multiplicity: 2,
            molecule: &mol,
        };
        let text = to_gjf_string(&input);
        assert!(text.contains("\n1 2\n"));

        let parsed = parse_gjf_content(&text, "round_trip").unwrap();
        assert_eq!(parsed.num_atoms(), mol.num_atoms());
        assert_eq!(parsed.connectivity, mol.connectivity);
        for (a, b) in parsed.atoms.iter().zip(mol.atoms.iter()) {
            assert_eq!(a.element, b.element);
            for k in 0..3 {
                assert!((a.position[k] - b.position[k]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_trailing_sections_kept_verbatim() {
        let content = format!(
            "{}\n\nC 0\n6-31G(d)\n****\n\n1 2 F\n",
            THIOPHENE.trim_end()
        );
        let mol = parse_gjf_content(&content, "gen").unwrap();
        assert_eq!(mol.connectivity.lines().count(), 6);
        assert_eq!(mol.trailing, "C 0\n6-31G(d)\n****\n\n1 2 F");

        let input = EngineInput {
            link0: Vec::new(),
            route: "# b3lyp/gen geom=connectivity".to_string(),
            title: "gen".to_string(),
            charge: 0,
            multiplicity: 1,
            molecule: &mol,
        };
        let text = to_gjf_string(&input);
        assert!(text.ends_with(" 6\n\nC 0\n6-31G(d)\n****\n\n1 2 F\n\n"));
        let parsed = parse_gjf_content(&text, "gen").unwrap();
        assert_eq!(parsed.connectivity, mol.connectivity);
        assert_eq!(parsed.trailing, mol.trailing);
    }

    #[test]
    fn test_no_connectivity_without_route_request() {
        let content = "# opt b3lyp/6-31g(d)\n\ntitle\n\n0 1\n H 0 0 0\n H 0 0 0.74\n\n";
        let mol = parse_gjf_content(content, "h2").unwrap();
        assert!(!mol.has_connectivity());
        assert!(mol.trailing.is_empty());

        // 路由行未要求连接性时，坐标后的块属于附加输入段
        let content = "# opt=modredundant b3lyp/6-31g(d)\n\ntitle\n\n0 1\n H 0 0 0\n H 0 0 0.74\n\n1 2 F\n\n";
        let mol = parse_gjf_content(content, "h2").unwrap();
        assert!(!mol.has_connectivity());
        assert_eq!(mol.trailing, "1 2 F");
    }

    #[test]
    fn test_parse_gjf_missing_route() {
        let content = "title only\n\n0 1\nC 0 0 0\n";
        assert!(parse_gjf_content(content, "bad").is_err());
    }
}
