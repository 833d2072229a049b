//! 补全后端抽象
//!
//! 分类客户端只依赖这个 trait，生产环境使用 [`LlmService`](super::LlmService)，
//! 测试中可以替换成脚本化的实现。

use async_trait::async_trait;

use crate::error::BackendError;

/// 一次补全请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// 是否使用深度推理模型
    pub extended_reasoning: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, extended_reasoning: bool) -> Self {
        Self {
            prompt: prompt.into(),
            extended_reasoning,
        }
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 发送请求，返回模型的原始文本
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;

    /// 是否配置了凭证
    fn has_credentials(&self) -> bool {
        true
    }
}
