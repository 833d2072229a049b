//! 分类客户端 - 业务能力层
//!
//! 两阶段协议：
//! 1. 首次请求，得到 7 字段结果
//! 2. 五元组不在 MapID 中时发起纠错请求；纠错结果有效则替换，否则保留首次结果并标记无效
//!
//! 每个请求各自带有限次数的指数退避重试，退避等待可被取消。底层错误在这里被归类为
//! [`ClassifyError`]。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ClassifyError;
use crate::models::classification::{parse_classification, ClassificationResult};
use crate::models::taxonomy::LeafIndex;
use crate::services::backend::{CompletionBackend, CompletionRequest};
use crate::services::prompts::{build_classify_prompt, build_fallback_prompt, VERIFY_PROMPT};
use crate::services::retry::{classify_failure, BackoffPolicy, FailureKind};

/// 分类客户端
pub struct ClassificationClient {
    backend: Arc<dyn CompletionBackend>,
    backoff: BackoffPolicy,
    preview_chars: usize,
}

impl ClassificationClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, backoff: BackoffPolicy, preview_chars: usize) -> Self {
        Self {
            backend,
            backoff,
            preview_chars,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.backend.has_credentials()
    }

    /// 对一道题进行分类
    ///
    /// # 参数
    /// - `exercise`: 题目内容（会被截断到预览长度）
    /// - `taxonomy_summary`: 分类体系摘要
    /// - `leaves`: 叶子索引，用于校验
    /// - `extended_reasoning`: 是否使用深度推理
    /// - `cancel`: 取消信号，只在退避等待时检查
    pub async fn classify(
        &self,
        exercise: &str,
        taxonomy_summary: &str,
        leaves: &LeafIndex,
        extended_reasoning: bool,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult, ClassifyError> {
        let preview = truncate_chars(exercise, self.preview_chars);

        let prompt = build_classify_prompt(taxonomy_summary, preview);
        let mut result = self.query(&prompt, extended_reasoning, cancel).await?;
        result.is_valid = leaves.contains(&result.key());

        if result.is_valid {
            return Ok(result);
        }

        debug!("首次分类 {} 不在 MapID 中，发起纠错请求", result.code());
        let prompt = build_fallback_prompt(taxonomy_summary, preview, &result.to_wire_json());
        match self.query(&prompt, extended_reasoning, cancel).await {
            Ok(mut corrected) if leaves.contains(&corrected.key()) => {
                corrected.is_valid = true;
                debug!("纠错成功: {} → {}", result.code(), corrected.code());
                Ok(corrected)
            }
            Ok(corrected) => {
                warn!("纠错结果 {} 仍不在 MapID 中，保留首次结果", corrected.code());
                Ok(result)
            }
            Err(ClassifyError::Transport { message }) => {
                warn!("纠错请求失败: {}，保留首次结果", message);
                Ok(result)
            }
            // 鉴权失败、配额耗尽、取消都交给编排层
            Err(e) => Err(e),
        }
    }

    /// 校验 API Key
    ///
    /// 鉴权失败和配额耗尽会返回错误，其他错误视为 Key 可用。
    pub async fn verify_credentials(&self) -> Result<(), ClassifyError> {
        let request = CompletionRequest::new(VERIFY_PROMPT, false);
        match self.backend.complete(&request).await {
            Ok(_) => Ok(()),
            Err(e) => match classify_failure(&e) {
                FailureKind::Auth => Err(ClassifyError::InvalidCredentials),
                FailureKind::RateLimit => Err(ClassifyError::QuotaExceeded),
                FailureKind::Transient => {
                    debug!("校验请求失败但不是鉴权问题: {}", e);
                    Ok(())
                }
            },
        }
    }

    /// 发送一次请求，带重试，并校验响应结构
    async fn query(
        &self,
        prompt: &str,
        extended_reasoning: bool,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult, ClassifyError> {
        let request = CompletionRequest::new(prompt, extended_reasoning);
        let max_attempts = self.backoff.max_attempts.max(1);
        let mut last_kind = FailureKind::Transient;
        let mut last_message = String::new();

        for attempt in 1..=max_attempts {
            match self.backend.complete(&request).await {
                Ok(text) => match parse_classification(&text) {
                    Ok(result) => return Ok(result),
                    Err(e) => {
                        warn!("响应结构无效 (尝试 {}/{}): {}", attempt, max_attempts, e);
                        last_kind = FailureKind::Transient;
                        last_message = e.to_string();
                    }
                },
                Err(e) => {
                    let kind = classify_failure(&e);
                    if kind == FailureKind::Auth {
                        return Err(ClassifyError::InvalidCredentials);
                    }
                    warn!("请求失败 (尝试 {}/{}): {}", attempt, max_attempts, e);
                    last_kind = kind;
                    last_message = e.message;
                }
            }

            if attempt < max_attempts {
                let delay = self.backoff.delay(last_kind, attempt);
                debug!("等待 {:?} 后重试", delay);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ClassifyError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        match last_kind {
            FailureKind::RateLimit => Err(ClassifyError::QuotaExceeded),
            FailureKind::Auth | FailureKind::Transient => Err(ClassifyError::transport(last_message)),
        }
    }
}

/// 按字符截断（不会切在 UTF-8 字符中间）
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
