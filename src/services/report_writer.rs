//! 报表写入服务 - 业务能力层
//!
//! 只负责"写 CSV 报表"能力，不关心流程

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::report::ProcessingResult;

/// UTF-8 BOM，方便表格软件识别编码
const BOM: &str = "\u{FEFF}";
const HEADER: &str = "Index,Content,ID,Status,Difficulty,Confidence";

/// 报表写入服务
///
/// 职责：
/// - 把一次运行的所有结果渲染为 CSV
/// - 写入 `<源文件>_report.csv`
pub struct ReportWriter {
    report_path: PathBuf,
}

impl ReportWriter {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.report_path
    }

    /// 渲染 CSV 文本
    ///
    /// 题目内容和编码用双引号包裹，内部双引号加倍，换行替换为空格。
    /// 编码来自模型输出，可能含有逗号或引号。
    pub fn render(results: &[ProcessingResult]) -> String {
        let mut lines = Vec::with_capacity(results.len() + 1);
        lines.push(HEADER.to_string());

        for result in results {
            lines.push(format!(
                "{},\"{}\",\"{}\",{},{},{}",
                result.index,
                escape_content(&result.preview),
                escape_content(&result.code),
                result.status,
                result.difficulty,
                result.confidence
            ));
        }

        format!("{}{}", BOM, lines.join("\n"))
    }

    /// 写入报表
    pub async fn write(&self, results: &[ProcessingResult]) -> AppResult<()> {
        debug!("写入报表: {} ({} 行)", self.report_path.display(), results.len());

        let content = Self::render(results);
        tokio::fs::write(&self.report_path, content)
            .await
            .map_err(|e| AppError::file_write_failed(self.report_path.display().to_string(), e))
    }
}

fn escape_content(text: &str) -> String {
    text.replace('"', "\"\"")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}
