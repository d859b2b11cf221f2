// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis_result::AnalysisResult;
use crate::domain::models::scan_result::ScanResult;
use async_trait::async_trait;
use thiserror::Error;

/// Retry-After 提示的上限（秒），更大的值按此截断
pub const MAX_RETRY_AFTER_SECS: u64 = 3600;

/// 分析服务错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// HTTP 429；`retry_after_seconds` 来自 Retry-After 头
    #[error("Analysis service rate limited (HTTP 429)")]
    RateLimited { retry_after_seconds: Option<u64> },

    /// 无法连接到分析服务
    #[error("Analysis service is not available: {0}")]
    ServiceUnavailable(String),

    /// 其他 4xx/5xx 响应，`body` 已截断
    #[error("Analysis service returned HTTP {status}: {body}")]
    ClientError { status: u16, body: String },

    /// 请求超时
    #[error("Analysis request timed out")]
    Timeout,

    /// 2xx 响应体无法解析
    #[error("Invalid analysis response: {0}")]
    InvalidResponse(String),
}

/// 分析服务特质
///
/// 将扫描结果发送到远程分析服务，返回发现、性能分和标签。
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// 分析一次扫描结果
    ///
    /// # 参数
    ///
    /// * `scan` - 扫描结果
    ///
    /// # 返回值
    ///
    /// * `Ok(AnalysisResult)` - 分析成功
    /// * `Err(AnalysisError)` - 分析失败
    async fn analyze(&self, scan: &ScanResult) -> Result<AnalysisResult, AnalysisError>;
}
