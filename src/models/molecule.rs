//! # 分子几何数据模型
//!
//! 孤立分子的笛卡尔坐标（Å）以及原样保留的连接性块和其后的附加输入段。
//!
//! ## 依赖关系
//! - 被 `parsers/gjf.rs`, `parsers/gaussian_log.rs` 创建
//! - 被 `reorg/driver.rs` 使用

use serde::{Deserialize, Serialize};

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 分子几何
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Molecule {
    /// 分子名称
    pub name: String,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 连接性块（`geom=connectivity` 所需），原样复制
    pub connectivity: String,

    /// 连接性块之后的附加输入段（ModRedundant、gen 基组等），原样复制
    pub trailing: String,
}

impl Molecule {
    pub fn new(name: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Molecule {
            name: name.into(),
            atoms,
            connectivity: String::new(),
            trailing: String::new(),
        }
    }

    /// 替换坐标，保留连接性与附加输入段
    pub fn with_atoms(&self, atoms: Vec<Atom>) -> Self {
        Molecule {
            name: self.name.clone(),
            atoms,
            connectivity: self.connectivity.clone(),
            trailing: self.trailing.clone(),
        }
    }

    /// 是否带有连接性块
    pub fn has_connectivity(&self) -> bool {
        !self.connectivity.trim().is_empty()
    }

    /// 原子数
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }
}
