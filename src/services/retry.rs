//! 单次请求的重试策略
//!
//! 有上限的指数退避；限流信号使用更长的基数。与编排层的配额冷却
//! （无上限、固定间隔）是两套独立的策略。

use std::time::Duration;

use crate::config::Config;
use crate::error::BackendError;

/// 后端失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 鉴权失败，不重试
    Auth,
    /// 限流 / 配额
    RateLimit,
    /// 其他暂时性错误（网络、响应格式）
    Transient,
}

const AUTH_MARKERS: [&str; 7] = [
    "401",
    "api_key_invalid",
    "api key not valid",
    "invalid api key",
    "incorrect api key",
    "unauthorized",
    "permission_denied",
];

const RATE_LIMIT_MARKERS: [&str; 6] = [
    "429",
    "quota",
    "rate limit",
    "rate_limit",
    "resource_exhausted",
    "too many requests",
];

/// 把后端原始错误归类
pub fn classify_failure(err: &BackendError) -> FailureKind {
    match err.status {
        Some(401) | Some(403) => return FailureKind::Auth,
        Some(429) => return FailureKind::RateLimit,
        _ => {}
    }

    let message = err.message.to_lowercase();
    if AUTH_MARKERS.iter().any(|m| message.contains(m)) {
        FailureKind::Auth
    } else if RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
        FailureKind::RateLimit
    } else {
        FailureKind::Transient
    }
}

/// 有上限的指数退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    pub transport_base: Duration,
    pub rate_limit_base: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transport_base: Duration::from_secs(1),
            rate_limit_base: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            transport_base: Duration::from_millis(config.transport_backoff_ms),
            rate_limit_base: Duration::from_millis(config.rate_limit_backoff_ms),
        }
    }

    /// 不等待，测试用
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            transport_base: Duration::ZERO,
            rate_limit_base: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次（从1开始）失败后的等待时间：基数 × 2^(attempt-1)
    pub fn delay(&self, kind: FailureKind, attempt: u32) -> Duration {
        let base = match kind {
            FailureKind::RateLimit => self.rate_limit_base,
            FailureKind::Auth | FailureKind::Transient => self.transport_base,
        };
        base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}
