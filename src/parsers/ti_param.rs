//! # 转移积分参数文件解析器
//!
//! 解析固定格式的色散参数记录。
//!
//! ## 文件格式
//! ```text
//! pentacene_HOMO     # line 1: 标签（包含 HOMO 或 LUMO）
//! 40                 # line 2: 离散点数 n (正整数)
//! 6.27               # line 3: a (Å)
//! 7.78               # line 4: b (Å)
//!                    # line 5: 空行
//! -33.1              # line 6-10: T12 T13 T23 T34 T35 (meV)
//! 52.0
//! 52.0
//! -80.2
//! -80.2
//!                    # line 11: 空行（文件末尾可省略）
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 使用
//! - 使用 `models/dispersion.rs`

use crate::error::{OscreenError, Result};
use crate::models::{BandKind, DispersionInput, TransferIntegrals};

use std::fs;
use std::path::Path;

/// 解析参数文件
pub fn parse_ti_file(path: &Path) -> Result<DispersionInput> {
    let content = fs::read_to_string(path).map_err(|e| OscreenError::read(path, e))?;
    parse_ti_content(&content, &path.display().to_string())
}

/// 从字符串内容解析参数记录
pub fn parse_ti_content(content: &str, source: &str) -> Result<DispersionInput> {
    let lines: Vec<&str> = content.lines().collect();

    let invalid = |line: usize, reason: String| OscreenError::InvalidParameterFile {
        path: source.to_string(),
        line,
        reason,
    };

    let line_at = |idx: usize| -> Result<&str> {
        lines
            .get(idx)
            .map(|l| l.trim())
            .ok_or_else(|| invalid(idx + 1, "unexpected end of file".to_string()))
    };

    // Line 1: 标签
    let label = line_at(0)?.to_string();
    if label.is_empty() {
        return Err(invalid(1, "empty label".to_string()));
    }
    let kind = BandKind::from_label(&label).ok_or_else(|| {
        invalid(
            1,
            format!("label '{}' must contain exactly one of HOMO/LUMO", label),
        )
    })?;

    // Line 2: n
    let n: usize = line_at(1)?
        .parse()
        .map_err(|_| invalid(2, format!("'{}' is not a positive integer", lines[1].trim())))?;
    if n < 1 {
        return Err(invalid(2, "n must be >= 1".to_string()));
    }

    // Line 3-4: a, b
    let a = parse_float(line_at(2)?).ok_or_else(|| invalid(3, "invalid a".to_string()))?;
    let b = parse_float(line_at(3)?).ok_or_else(|| invalid(4, "invalid b".to_string()))?;
    if a <= 0.0 {
        return Err(invalid(3, format!("a must be > 0, got {}", a)));
    }
    if b <= 0.0 {
        return Err(invalid(4, format!("b must be > 0, got {}", b)));
    }

    // Line 5: 空行
    if !line_at(4)?.is_empty() {
        return Err(invalid(5, "expected a blank line".to_string()));
    }

    // Line 6-10: 转移积分
    let mut values = [0.0; 5];
    for (i, value) in values.iter_mut().enumerate() {
        let raw = line_at(5 + i)?;
        *value = parse_float(raw)
            .ok_or_else(|| invalid(6 + i, format!("invalid transfer integral '{}'", raw)))?;
    }

    // Line 11: 空行，文件结尾视为空行
    if let Some(line) = lines.get(10) {
        if !line.trim().is_empty() {
            return Err(invalid(11, "expected a blank line".to_string()));
        }
    }

    Ok(DispersionInput {
        label,
        kind,
        n,
        a,
        b,
        t: TransferIntegrals {
            t12: values[0],
            t13: values[1],
            t23: values[2],
            t34: values[3],
            t35: values[4],
        },
    })
}

fn parse_float(s: &str) -> Option<f64> {
    s.split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
