//! 题目处理上下文
//!
//! 封装"我正在处理第几道题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseCtx {
    /// 题目序号（从1开始）
    pub index: usize,

    /// 题目总数（仅用于日志显示）
    pub total: usize,
}

impl ExerciseCtx {
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}

impl Display for ExerciseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[练习 {}/{}]", self.index, self.total)
    }
}
