//! 命令定义和实现

pub mod check;
pub mod run;

pub use check::CheckCommand;
pub use run::RunCommand;

use anyhow::{Context, Result};

/// 解析逗号分隔的浮点数列表
pub fn parse_values(input: &str, what: &str) -> Result<Vec<f64>> {
    input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse {what}: {input:?}"))
}
