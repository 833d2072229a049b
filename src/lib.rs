//! # Exercise Tagger
//!
//! 给 LaTeX 数学试卷中的每道题打上分类编码的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 跨运行的本地状态
//! - `SettingsStore` - 保存 API Key 和缓存的 MapID
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `taxonomy_parser` - 解析 MapID 大纲
//! - `exercise_extractor` - 提取 ex / bt / vd 题目
//! - `ClassificationClient` - 两阶段分类（首次请求 + 纠错）
//! - `LlmService` - 调用模型能力
//! - `reassemble` / `ReportWriter` - 写回文档、写 CSV 报表
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `ExerciseCtx` - 上下文封装（序号 + 总数）
//! - `ExerciseFlow` - 分类 → 报表行
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 加载输入、校验 Key、写出结果
//! - `orchestrator/run_processor` - 逐题处理、冷却、取消
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ClassifyError};
pub use infrastructure::SettingsStore;
pub use models::{ClassificationResult, ExerciseBlock, ProcessingResult, Taxonomy};
pub use orchestrator::{App, RunEvent, RunOutcome, RunProcessor, RunState};
pub use services::{ClassificationClient, CompletionBackend, LlmService};
pub use workflow::{ExerciseCtx, ExerciseFlow};
