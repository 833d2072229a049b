//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、输出）
//! - 加载 MapID 与 TeX 文档
//! - 校验 API Key
//! - 输出全局统计信息
//!
//! ### `run_processor` - 单次运行处理器
//! - 逐题调用 ExerciseFlow（一次只有一个请求在途）
//! - 题目间隔、配额冷却、取消
//! - 完成后重组文档
//!
//! ### `cooldown` - 配额冷却策略
//!
//! ## 层次关系
//!
//! ```text
//! app (加载输入 / 写出结果)
//!     ↓
//! run_processor (处理 Vec<ExerciseBlock>)
//!     ↓
//! workflow::ExerciseFlow (处理单个 ExerciseBlock)
//!     ↓
//! services (能力层：分类 / 重组 / 报表)
//!     ↓
//! infrastructure (基础设施：SettingsStore)
//! ```

pub mod app;
pub mod cooldown;
pub mod run_processor;

// 重新导出主要类型
pub use app::App;
pub use cooldown::CooldownPolicy;
pub use run_processor::{RunEvent, RunOutcome, RunProcessor, RunState, RunStats};
