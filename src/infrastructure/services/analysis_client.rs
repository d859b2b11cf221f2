// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis_result::AnalysisResult;
use crate::domain::models::scan_result::ScanResult;
use crate::domain::services::analysis_service::{
    AnalysisError, AnalysisService, MAX_RETRY_AFTER_SECS,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, warn};

const ANALYZE_PATH: &str = "/analyze-audit-data";
const BODY_SNIPPET_CHARS: usize = 400;

/// 分析服务HTTP客户端
pub struct HttpAnalysisClient {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 完整的分析端点地址
    endpoint: String,
}

impl HttpAnalysisClient {
    /// 创建新的分析客户端
    ///
    /// # 参数
    ///
    /// * `base_url` - 分析服务基础地址
    /// * `timeout` - 单次请求超时
    ///
    /// # 返回值
    ///
    /// HTTP 客户端无法构建时返回错误，不会退化为无超时的客户端
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, scan: &ScanResult) -> Result<AnalysisResult, AnalysisError> {
        debug!("Sending scan of {} to {}", scan.url, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(scan)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Analysis service returned 429 (retry-after: {:?}): {}",
                retry_after_seconds,
                truncate(&body)
            );
            return Err(AnalysisError::RateLimited {
                retry_after_seconds,
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let body = truncate(&body);
            error!("Analysis service returned HTTP {}: {}", status.as_u16(), body);
            return Err(AnalysisError::ClientError {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<AnalysisResult>(&body)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::Timeout
    } else {
        AnalysisError::ServiceUnavailable(e.to_string())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// 解析 Retry-After 头
///
/// 支持秒数（整数或小数，向上取整）和 HTTP 日期；过去的日期得到 0。
/// 结果不超过 [`MAX_RETRY_AFTER_SECS`]。
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let secs = if let Ok(secs) = value.parse::<u64>() {
        secs
    } else if let Ok(secs) = value.parse::<f64>() {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        secs.min(MAX_RETRY_AFTER_SECS as f64).ceil() as u64
    } else {
        let date = DateTime::parse_from_rfc2822(value).ok()?;
        let millis = (date.with_timezone(&Utc) - now).num_milliseconds();
        (millis.max(0) as u64).div_ceil(1000)
    };
    Some(secs.min(MAX_RETRY_AFTER_SECS))
}
