use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 整体读入一个文本文件（MapID 或 TeX）
pub async fn load_document(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("文件不存在: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    tracing::info!(
        "已加载: {} ({} 字节)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        content.len()
    );

    Ok(content)
}

/// 输出文件路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// 标注后的 TeX
    pub document: PathBuf,
    /// CSV 报表
    pub report: PathBuf,
}

/// 根据源文件推导输出路径：`de.tex` → `de_tagged.tex` / `de_report.csv`
pub fn output_paths(source: &Path) -> OutputPaths {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let dir = source.parent().unwrap_or_else(|| Path::new(""));

    OutputPaths {
        document: dir.join(format!("{}_tagged.tex", stem)),
        report: dir.join(format!("{}_report.csv", stem)),
    }
}
