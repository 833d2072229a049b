use crate::models::classification::ClassificationResult;
use crate::models::exercise::ExerciseBlock;

/// 单道题的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// 编码命中 MapID
    Valid,
    /// 编码未命中 MapID，但仍然写回
    Warning,
    /// 请求失败
    Error,
}

impl ProcessStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStatus::Valid => "valid",
            ProcessStatus::Warning => "warning",
            ProcessStatus::Error => "error",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ProcessStatus::Valid => "✅",
            ProcessStatus::Warning => "⚠️",
            ProcessStatus::Error => "❌",
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 报表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    /// 序号（从1开始）
    pub index: usize,
    /// 题目内容
    pub preview: String,
    /// 写回的编码，失败时为 `[ERROR]`
    pub code: String,
    pub status: ProcessStatus,
    /// 如 `90%`
    pub confidence: String,
    /// 难度代码，失败时为 `N/A`
    pub difficulty: String,
    /// 原文中的题目块
    pub block: ExerciseBlock,
    pub error_message: Option<String>,
}

pub const ERROR_CODE: &str = "[ERROR]";

impl ProcessingResult {
    pub fn from_classification(index: usize, block: ExerciseBlock, result: &ClassificationResult) -> Self {
        Self {
            index,
            preview: block.body().to_string(),
            code: result.code(),
            status: if result.is_valid {
                ProcessStatus::Valid
            } else {
                ProcessStatus::Warning
            },
            confidence: result.confidence_percent(),
            difficulty: result.difficulty.code().to_string(),
            block,
            error_message: None,
        }
    }

    pub fn failed(index: usize, block: ExerciseBlock, message: impl Into<String>) -> Self {
        Self {
            index,
            preview: block.body().to_string(),
            code: ERROR_CODE.to_string(),
            status: ProcessStatus::Error,
            confidence: "0%".to_string(),
            difficulty: "N/A".to_string(),
            block,
            error_message: Some(message.into()),
        }
    }

    /// 需要写回文档的标注，失败的题目不写
    pub fn annotation(&self) -> Option<&str> {
        match self.status {
            ProcessStatus::Error => None,
            ProcessStatus::Valid | ProcessStatus::Warning => Some(&self.code),
        }
    }
}
