// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::AuditError;
use std::time::Duration;

/// 重试策略配置
///
/// 普通失败与限流失败使用各自的线性退避常量。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大重试次数
    pub max_retries: u32,
    /// 普通失败退避基数
    pub base_backoff: Duration,
    /// 限流退避基数（无 Retry-After 时）
    pub rate_limit_backoff_base: Duration,
    /// 限流退避上限
    pub rate_limit_backoff_max: Duration,
    /// 全局限流冷却时间（分析服务未给出提示时）
    pub global_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff: Duration::from_millis(5000),
            rate_limit_backoff_base: Duration::from_millis(15000),
            rate_limit_backoff_max: Duration::from_millis(120000),
            global_cooldown: Duration::from_millis(60000),
        }
    }
}

impl RetryPolicy {
    /// 计算第 `retry_count` 次失败后的重试延迟
    pub fn delay_for(&self, error: &AuditError, retry_count: u32) -> Duration {
        match error {
            AuditError::RateLimited {
                retry_after: Some(hint),
                ..
            } if !hint.is_zero() => *hint,
            AuditError::RateLimited { .. } => self
                .rate_limit_backoff_base
                .saturating_mul(retry_count)
                .min(self.rate_limit_backoff_max),
            _ => self.base_backoff.saturating_mul(retry_count),
        }
    }

    /// 是否还能重试
    pub fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }
}
