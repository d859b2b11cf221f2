// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis_result::AnalysisResult;
use crate::domain::models::report::{Report, ReportAnalysis, ReportMetadata, ReportSummary};
use crate::domain::models::scan_result::{DetectedScript, ScanResult};
use crate::domain::services::health_scorer::HealthScorer;

/// 报告中保留的统计/标签管理脚本域名（子串匹配）
pub const TRACKING_SCRIPT_DOMAINS: &[&str] = &[
    "googletagmanager",
    "google-analytics",
    "facebook",
    "linkedin",
    "tiktok",
];

/// 报告中保留的网络请求条数
pub const REPORT_NETWORK_LIMIT: usize = 50;

/// 报告组装器
///
/// 纯函数：相同的扫描结果与分析结果总是生成相同的报告。
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    scorer: HealthScorer,
}

impl ReportAssembler {
    pub fn new(scorer: HealthScorer) -> Self {
        Self { scorer }
    }

    pub fn assemble(&self, scan: &ScanResult, analysis: &AnalysisResult) -> Report {
        let health_score = self.scorer.score(
            &analysis.audit_findings,
            &analysis.performance_scores,
            &analysis.processed_tags,
        );

        Report {
            summary: ReportSummary {
                url: scan.url.clone(),
                timestamp: scan.timestamp,
                total_scripts: scan.detected_scripts.len(),
                total_tags: scan.injected_tags.len(),
                total_network_requests: scan.network_requests.len(),
            },
            tags: scan.injected_tags.clone(),
            performance: scan.performance_metrics.clone(),
            scripts: scan
                .detected_scripts
                .iter()
                .filter(|s| is_tracking_script(s))
                .cloned()
                .collect(),
            network: scan
                .network_requests
                .iter()
                .take(REPORT_NETWORK_LIMIT)
                .cloned()
                .collect(),
            health_score,
            analysis: ReportAnalysis {
                summary: analysis.audit_summary.clone(),
                findings: analysis.audit_findings.clone(),
                processed_tags: analysis.processed_tags.clone(),
                performance_scores: analysis.performance_scores.clone(),
            },
            metadata: ReportMetadata {
                processed_by_analysis_service: true,
                analysis_timestamp: analysis.analysis_timestamp.clone(),
                processing_time_ms: analysis.processing_time_ms,
            },
        }
    }
}

fn is_tracking_script(script: &DetectedScript) -> bool {
    TRACKING_SCRIPT_DOMAINS
        .iter()
        .any(|domain| script.src.contains(domain))
}
