// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// 单次冷却的最长时间
const MAX_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// 全局限流冷却窗口
///
/// 冷却期间所有任务都不再发起新的分析请求。
#[derive(Debug, Default)]
pub struct RateLimitWindow {
    until: Mutex<Option<Instant>>,
}

impl RateLimitWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从现在起冷却 `duration`；不会缩短已有的更长窗口
    pub fn extend(&self, duration: Duration) {
        if duration > MAX_COOLDOWN {
            warn!("Cooldown of {:?} exceeds limit, using {:?}", duration, MAX_COOLDOWN);
        }
        let now = Instant::now();
        let candidate = now
            .checked_add(duration.min(MAX_COOLDOWN))
            .unwrap_or(now);
        let mut until = self.until.lock();
        match *until {
            Some(current) if current >= candidate => {}
            _ => *until = Some(candidate),
        }
    }

    /// 剩余冷却时间；窗口已结束时返回 None
    pub fn remaining(&self) -> Option<Duration> {
        let until = (*self.until.lock())?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    pub fn is_active(&self) -> bool {
        self.remaining().is_some()
    }

    /// 剩余时间向上取整到秒，用作重试提示
    pub fn remaining_hint(&self) -> Option<Duration> {
        self.remaining().map(|left| {
            let secs = left.as_millis().div_ceil(1000) as u64;
            Duration::from_secs(secs.max(1))
        })
    }
}
