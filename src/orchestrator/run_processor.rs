//! 单次运行处理器 - 编排层
//!
//! ## 职责
//!
//! 按文档顺序逐题处理，一次只有一个请求在途。
//!
//! ## 核心功能
//!
//! 1. **启动检查**：MapID 非空、题目非空、有 API Key
//! 2. **流程调度**：逐题委托 `ExerciseFlow`
//! 3. **节奏控制**：两题之间固定间隔
//! 4. **配额冷却**：配额耗尽后冷却，然后重试同一道题
//! 5. **取消**：退避、间隔和冷却期间检查取消信号，取消后丢弃结果
//! 6. **写回**：全部完成后重组文档
//!
//! ## 状态
//!
//! ```text
//! Idle → Running ⇄ AwaitingCooldown
//!           ↓
//!   Completed | Cancelled | Failed
//! ```

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, BusinessError, ClassifyError, ConfigError};
use crate::models::exercise::ExerciseBlock;
use crate::models::report::{ProcessStatus, ProcessingResult};
use crate::models::taxonomy::Taxonomy;
use crate::orchestrator::cooldown::CooldownPolicy;
use crate::services::reassemble;
use crate::utils::logging::{log_cooldown, log_exercise_start};
use crate::workflow::{ExerciseCtx, ExerciseFlow};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    /// 配额耗尽，正在冷却
    AwaitingCooldown,
    Completed,
    Cancelled,
    Failed,
}

/// 运行过程中的进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    StateChanged(RunState),
    ExerciseStarted { index: usize, total: usize },
    ExerciseFinished(ProcessingResult),
    CooldownTick { index: usize, remaining_secs: u64 },
}

/// 一次运行的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// 全部处理完成
    Completed {
        document: String,
        results: Vec<ProcessingResult>,
    },
    /// 被取消，结果已丢弃
    Cancelled { processed: usize },
    /// 致命错误，不写回文档
    Failed {
        error: ClassifyError,
        results: Vec<ProcessingResult>,
    },
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed { .. } => RunState::Completed,
            RunOutcome::Cancelled { .. } => RunState::Cancelled,
            RunOutcome::Failed { .. } => RunState::Failed,
        }
    }
}

/// 结果统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub valid: usize,
    pub warning: usize,
    pub error: usize,
}

impl RunStats {
    pub fn from_results(results: &[ProcessingResult]) -> Self {
        results.iter().fold(Self::default(), |mut stats, row| {
            match row.status {
                ProcessStatus::Valid => stats.valid += 1,
                ProcessStatus::Warning => stats.warning += 1,
                ProcessStatus::Error => stats.error += 1,
            }
            stats
        })
    }

    pub fn total(&self) -> usize {
        self.valid + self.warning + self.error
    }
}

/// 单次运行处理器
pub struct RunProcessor {
    flow: ExerciseFlow,
    pacing_delay: Duration,
    cooldown: CooldownPolicy,
    events: Option<UnboundedSender<RunEvent>>,
    state: RunState,
}

impl RunProcessor {
    pub fn new(flow: ExerciseFlow, pacing_delay: Duration, cooldown: CooldownPolicy) -> Self {
        Self {
            flow,
            pacing_delay,
            cooldown,
            events: None,
            state: RunState::Idle,
        }
    }

    pub fn from_config(flow: ExerciseFlow, config: &Config) -> Self {
        Self::new(flow, config.pacing_delay(), CooldownPolicy::from_config(config))
    }

    /// 订阅进度事件
    pub fn with_events(mut self, sender: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// 处理一份文档
    ///
    /// # 参数
    /// - `document`: 原始文档
    /// - `blocks`: 从 `document` 中提取出的题目
    /// - `taxonomy`: 分类体系
    /// - `cancel`: 取消信号
    ///
    /// # 返回
    /// 启动检查失败返回 `Err`，其余情况都以 [`RunOutcome`] 结束
    pub async fn start(
        &mut self,
        document: &str,
        blocks: &[ExerciseBlock],
        taxonomy: &Taxonomy,
        cancel: &CancellationToken,
    ) -> AppResult<RunOutcome> {
        if taxonomy.is_empty() {
            return Err(BusinessError::EmptyTaxonomy.into());
        }
        if blocks.is_empty() {
            return Err(BusinessError::NoExercises.into());
        }
        if !self.flow.client().has_credentials() {
            return Err(ConfigError::MissingApiKey.into());
        }

        self.set_state(RunState::Running);
        let outcome = self.process(document, blocks, taxonomy, cancel).await;
        self.set_state(outcome.state());
        Ok(outcome)
    }

    async fn process(
        &mut self,
        document: &str,
        blocks: &[ExerciseBlock],
        taxonomy: &Taxonomy,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let total = blocks.len();
        let mut results: Vec<ProcessingResult> = Vec::with_capacity(total);

        for (i, block) in blocks.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.cancelled(results.len());
            }

            let ctx = ExerciseCtx::new(i + 1, total);
            log_exercise_start(ctx.index, total);
            self.emit(RunEvent::ExerciseStarted { index: ctx.index, total });

            // 配额耗尽时冷却后重试同一道题，次数不限
            let row = loop {
                match self.flow.run(block, &ctx, taxonomy, cancel).await {
                    Ok(row) => break row,
                    Err(ClassifyError::QuotaExceeded) => {
                        warn!("{} ⏳ API 配额耗尽，冷却 {} 秒后重试", ctx, self.cooldown.seconds);
                        if !self.await_cooldown(ctx.index, cancel).await {
                            return self.cancelled(results.len());
                        }
                        self.set_state(RunState::Running);
                    }
                    Err(ClassifyError::InvalidCredentials) => {
                        error!("{} ❌ API Key 无效，终止处理", ctx);
                        return RunOutcome::Failed {
                            error: ClassifyError::InvalidCredentials,
                            results,
                        };
                    }
                    Err(ClassifyError::Transport { message }) => {
                        break ProcessingResult::failed(ctx.index, block.clone(), message);
                    }
                    Err(ClassifyError::Cancelled) => return self.cancelled(results.len()),
                }
            };

            self.emit(RunEvent::ExerciseFinished(row.clone()));
            results.push(row);

            if i + 1 < total {
                tokio::select! {
                    _ = cancel.cancelled() => return self.cancelled(results.len()),
                    _ = tokio::time::sleep(self.pacing_delay) => {}
                }
            }
        }

        if cancel.is_cancelled() {
            return self.cancelled(results.len());
        }

        let document = reassemble(document, &results);
        RunOutcome::Completed { document, results }
    }

    async fn await_cooldown(&mut self, index: usize, cancel: &CancellationToken) -> bool {
        self.set_state(RunState::AwaitingCooldown);

        let events = self.events.clone();
        self.cooldown
            .wait(cancel, |remaining_secs| {
                log_cooldown(index, remaining_secs);
                if let Some(sender) = &events {
                    let _ = sender.send(RunEvent::CooldownTick { index, remaining_secs });
                }
            })
            .await
    }

    fn cancelled(&self, processed: usize) -> RunOutcome {
        info!("🛑 已取消，丢弃 {} 条结果", processed);
        RunOutcome::Cancelled { processed }
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            self.state = state;
            self.emit(RunEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sender) = &self.events {
            // 接收端已关闭时忽略
            let _ = sender.send(event);
        }
    }
}
