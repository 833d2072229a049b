//! LLM 服务 - 业务能力层
//!
//! 只负责"调用模型"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）
//! - 关闭 `async-openai` 自带的 429/5xx 重试，每次调用只发一个 HTTP 请求

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::BackendError;
use crate::services::backend::{CompletionBackend, CompletionRequest};
use crate::services::prompts::SYSTEM_MESSAGE;

/// 普通模式下的最大输出 token
const MAX_TOKENS: u32 = 1024;
/// 深度推理模式下的最大输出 token（推理过程也计入）
const REASONING_MAX_TOKENS: u32 = 8192;

/// 视为鉴权失败的错误 code / type
const AUTH_ERROR_CODES: &[&str] = &[
    "invalid_api_key",
    "api_key_invalid",
    "authentication_error",
    "unauthenticated",
    "permission_denied",
];
/// 视为限流或配额耗尽的错误 code / type
const RATE_LIMIT_ERROR_CODES: &[&str] = &[
    "insufficient_quota",
    "rate_limit_exceeded",
    "rate_limit_error",
    "resource_exhausted",
    "requests",
    "tokens",
];

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 完成分类请求
/// - 不解析响应内容
/// - 不做重试，重试由分类客户端负责
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    reasoning_model_name: String,
    has_api_key: bool,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        Self::with_api_key(config, &config.llm_api_key)
    }

    /// 使用指定的 API Key（来自设置文件时）
    pub fn with_api_key(config: &Config, api_key: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        // 最大耗时为 0：第一次失败后不再重试
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry),
            model_name: config.llm_model_name.clone(),
            reasoning_model_name: config.llm_reasoning_model_name.clone(),
            has_api_key: !api_key.trim().is_empty(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `extended_reasoning`: 是否使用深度推理模型
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        extended_reasoning: bool,
    ) -> Result<String, BackendError> {
        let (model, max_tokens) = if extended_reasoning {
            (&self.reasoning_model_name, REASONING_MAX_TOKENS)
        } else {
            (&self.model_name, MAX_TOKENS)
        };

        debug!("调用 LLM API，模型: {}", model);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| BackendError::new(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| BackendError::new(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(model.as_str())
            .messages(messages)
            .temperature(0.1)
            .top_p(0.95)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| BackendError::new(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            to_backend_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| BackendError::new("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

/// 把 API 返回的错误 code / type 映射成状态码
///
/// `async-openai` 不暴露 HTTP 状态码，只能从错误体里识别鉴权和限流。
fn to_backend_error(err: OpenAIError) -> BackendError {
    let message = err.to_string();
    let OpenAIError::ApiError(api) = &err else {
        return BackendError::new(message);
    };

    let labels: Vec<String> = [&api.code, &api.r#type]
        .into_iter()
        .flatten()
        .map(|label| label.to_lowercase())
        .collect();
    let matches = |codes: &[&str]| {
        labels
            .iter()
            .any(|label| codes.iter().any(|code| label.as_str() == *code))
    };

    if matches(AUTH_ERROR_CODES) {
        BackendError::with_status(401, message)
    } else if matches(RATE_LIMIT_ERROR_CODES) {
        BackendError::with_status(429, message)
    } else {
        BackendError::new(message)
    }
}

#[async_trait]
impl CompletionBackend for LlmService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.send_to_llm(&request.prompt, Some(SYSTEM_MESSAGE), request.extended_reasoning)
            .await
    }

    fn has_credentials(&self) -> bool {
        self.has_api_key
    }
}
