//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 分类（首次请求 → 校验 → 必要时纠错）
//! 2. 生成报表行
//! 3. 网络类失败降级为错误行；鉴权失败、配额耗尽、取消交给编排层处理

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ClassifyError;
use crate::models::exercise::ExerciseBlock;
use crate::models::report::{ProcessStatus, ProcessingResult};
use crate::models::taxonomy::Taxonomy;
use crate::services::ClassificationClient;
use crate::utils::logging::truncate_text;
use crate::workflow::exercise_ctx::ExerciseCtx;

/// 题目处理流程
///
/// - 决定一道题的结果是有效、警告还是错误
/// - 不负责节奏控制和冷却
/// - 只依赖业务能力（services）
pub struct ExerciseFlow {
    client: ClassificationClient,
    use_extended_reasoning: bool,
    verbose_logging: bool,
}

impl ExerciseFlow {
    pub fn new(client: ClassificationClient, use_extended_reasoning: bool, verbose_logging: bool) -> Self {
        Self {
            client,
            use_extended_reasoning,
            verbose_logging,
        }
    }

    pub fn client(&self) -> &ClassificationClient {
        &self.client
    }

    /// 处理一道题
    ///
    /// # 返回
    /// - `Ok(ProcessingResult)`: 有效 / 警告 / 错误行
    /// - `Err(InvalidCredentials | QuotaExceeded | Cancelled)`: 需要编排层决定
    pub async fn run(
        &self,
        block: &ExerciseBlock,
        ctx: &ExerciseCtx,
        taxonomy: &Taxonomy,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, ClassifyError> {
        if self.verbose_logging {
            info!("{} 📝 题目: {}", ctx, truncate_text(block.body(), 80));
        }

        let outcome = self
            .client
            .classify(
                block.body(),
                &taxonomy.summary,
                &taxonomy.index,
                self.use_extended_reasoning,
                cancel,
            )
            .await;

        match outcome {
            Ok(result) => {
                let row = ProcessingResult::from_classification(ctx.index, block.clone(), &result);
                match row.status {
                    ProcessStatus::Valid => info!(
                        "{} {} {} (难度: {}, 置信度: {})",
                        ctx,
                        row.status.emoji(),
                        row.code,
                        taxonomy.legend.label(result.difficulty),
                        row.confidence
                    ),
                    _ => warn!("{} {} {} 不在 MapID 中，仍然写回", ctx, row.status.emoji(), row.code),
                }
                Ok(row)
            }
            Err(ClassifyError::Transport { message }) => {
                error!("{} ❌ 分类失败: {}", ctx, message);
                Ok(ProcessingResult::failed(ctx.index, block.clone(), message))
            }
            Err(e) => Err(e),
        }
    }
}
