// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::analysis_result::{Finding, PerformanceScores, ProcessedTag};
use super::scan_result::{DetectedScript, InjectedTag, NetworkRequest, PerformanceMetrics};

/// 审计报告
///
/// 每次流水线成功运行生成一次，之后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: ReportSummary,
    pub tags: Vec<InjectedTag>,
    pub performance: PerformanceMetrics,
    /// 仅保留统计/标签管理相关脚本
    pub scripts: Vec<DetectedScript>,
    /// 前 50 条网络请求
    pub network: Vec<NetworkRequest>,
    pub health_score: u8,
    pub analysis: ReportAnalysis,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub total_scripts: usize,
    pub total_tags: usize,
    pub total_network_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    pub summary: Value,
    pub findings: Vec<Finding>,
    pub processed_tags: Vec<ProcessedTag>,
    pub performance_scores: PerformanceScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub processed_by_analysis_service: bool,
    pub analysis_timestamp: Option<Value>,
    pub processing_time_ms: Option<f64>,
}
