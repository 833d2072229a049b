//! 配额冷却
//!
//! 配额耗尽后固定等待一段时间，每个步长回调一次剩余秒数。
//! 等待期间随时可以被取消。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// 冷却策略：固定时长、无上限次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// 冷却秒数
    pub seconds: u64,
    /// 每秒倒计时对应的实际等待
    pub tick: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            seconds: 30,
            tick: Duration::from_secs(1),
        }
    }
}

impl CooldownPolicy {
    /// 冷却至少 1 秒
    pub fn from_config(config: &Config) -> Self {
        Self {
            seconds: config.cooldown_secs.max(1),
            tick: Duration::from_millis(config.cooldown_tick_ms),
        }
    }

    /// 倒计时，剩余秒数从 `seconds` 递减到 1
    ///
    /// # 返回
    /// 倒计时走完返回 `true`，被取消返回 `false`
    pub async fn wait<F>(&self, cancel: &CancellationToken, mut on_tick: F) -> bool
    where
        F: FnMut(u64),
    {
        for remaining in (1..=self.seconds).rev() {
            if cancel.is_cancelled() {
                return false;
            }
            on_tick(remaining);

            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.tick) => {}
            }
        }
        !cancel.is_cancelled()
    }
}
