//! # 元素周期表
//!
//! 原子序数与元素符号之间的映射 (Z = 1…86)。
//!
//! ## 依赖关系
//! - 被 `parsers/gaussian_log.rs` 和 `parsers/gjf.rs` 使用
//! - 纯静态数据，无外部依赖

use crate::error::{OscreenError, Result};

use std::collections::HashMap;
use std::sync::LazyLock;

/// 按原子序数排列的元素符号（下标 = Z − 1）
pub static SYMBOLS: [&str; 86] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", // 1-10
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", // 11-20
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", // 21-30
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", // 31-40
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", // 41-50
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", // 51-60
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", // 61-70
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", // 71-80
    "Tl", "Pb", "Bi", "Po", "At", "Rn", // 81-86
];

/// 元素符号 → 原子序数
static ATOMIC_NUMBERS: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, i as u32 + 1))
        .collect()
});

/// 原子序数 → 元素符号
pub fn symbol(z: u32) -> Result<&'static str> {
    if z == 0 {
        return Err(OscreenError::UnknownAtomicNumber(z));
    }
    SYMBOLS
        .get(z as usize - 1)
        .copied()
        .ok_or(OscreenError::UnknownAtomicNumber(z))
}

/// 规范化元素符号（首字母大写），并校验其存在
pub fn normalize_symbol(raw: &str) -> Result<&'static str> {
    let mut chars = raw.chars();
    let canonical = match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => return Err(OscreenError::UnknownElement(raw.to_string())),
    };

    ATOMIC_NUMBERS
        .get_key_value(canonical.as_str())
        .map(|(s, _)| *s)
        .ok_or_else(|| OscreenError::UnknownElement(raw.to_string()))
}

/// 元素符号 → 原子序数
pub fn atomic_number(symbol: &str) -> Result<u32> {
    let canonical = normalize_symbol(symbol)?;
    ATOMIC_NUMBERS
        .get(canonical)
        .copied()
        .ok_or_else(|| OscreenError::UnknownElement(symbol.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(symbol(1).unwrap(), "H");
        assert_eq!(symbol(6).unwrap(), "C");
        assert_eq!(symbol(16).unwrap(), "S");
        assert_eq!(symbol(36).unwrap(), "Kr");
        assert_eq!(symbol(86).unwrap(), "Rn");
        assert!(symbol(0).is_err());
        assert!(symbol(87).is_err());
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("c").unwrap(), "C");
        assert_eq!(normalize_symbol("CL").unwrap(), "Cl");
        assert_eq!(atomic_number("Se").unwrap(), 34);
        assert!(normalize_symbol("Xx").is_err());
        assert!(normalize_symbol("").is_err());
    }
}
