// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;

/// 审计流水线错误类型
///
/// 调度器只根据这里的分类决定重试还是终止。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuditError {
    /// 不可恢复（URL非法、DNS解析失败），不再重试
    #[error("Unrecoverable: {0}")]
    Unrecoverable(String),

    /// 分析服务限流或全局冷却窗口未结束
    #[error("Rate limited: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// 其他可重试错误
    #[error("{0}")]
    Transient(String),
}

impl AuditError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        AuditError::RateLimited {
            retry_after,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        AuditError::Transient(message.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AuditError::RateLimited { .. })
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, AuditError::Unrecoverable(_))
    }

    /// 限流提示的等待时间
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AuditError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            AuditError::Unrecoverable(_) => "unrecoverable",
            AuditError::RateLimited { .. } => "rate_limited",
            AuditError::Transient(_) => "transient",
        }
    }
}
