// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::audit_job::{AuditStatus, AuditUpdate};
use crate::domain::models::job::Job;
use crate::domain::models::scan_result::ScanResult;
use crate::domain::repositories::audit_job_repository::AuditJobRepository;
use crate::domain::services::analysis_service::{
    AnalysisError, AnalysisService, MAX_RETRY_AFTER_SECS,
};
use crate::domain::services::report_assembler::ReportAssembler;
use crate::engines::traits::ScanEngine;
use crate::infrastructure::metrics::SCAN_CACHE_HITS;
use crate::queue::rate_limit_window::RateLimitWindow;
use crate::queue::scan_cache::ScanCache;
use crate::utils::errors::AuditError;
use crate::utils::reachability::{Reachability, ReachabilityCheck};

/// 审计流水线
///
/// 对单个任务依次执行：预检、扫描（或复用缓存）、分析、组装报告。
/// 每个阶段要么返回结果，要么返回已分类的 [`AuditError`]；
/// 是否重试由调度器决定。
pub struct AuditPipeline {
    repository: Arc<dyn AuditJobRepository>,
    engine: Arc<dyn ScanEngine>,
    analysis: Arc<dyn AnalysisService>,
    prechecker: Arc<dyn ReachabilityCheck>,
    assembler: ReportAssembler,
    default_cooldown: Duration,
}

impl AuditPipeline {
    /// 创建新的审计流水线
    pub fn new(
        repository: Arc<dyn AuditJobRepository>,
        engine: Arc<dyn ScanEngine>,
        analysis: Arc<dyn AnalysisService>,
        prechecker: Arc<dyn ReachabilityCheck>,
        assembler: ReportAssembler,
        default_cooldown: Duration,
    ) -> Self {
        Self {
            repository,
            engine,
            analysis,
            prechecker,
            assembler,
            default_cooldown,
        }
    }

    pub fn repository(&self) -> &Arc<dyn AuditJobRepository> {
        &self.repository
    }

    /// 执行一次流水线
    ///
    /// # 参数
    ///
    /// * `job` - 队列任务
    /// * `cache` - 扫描结果缓存
    /// * `window` - 全局限流窗口
    #[instrument(skip_all, fields(job_id = %job.id, store_id = %job.payload.store_job_id, url = %job.payload.url))]
    pub async fn run(
        &self,
        job: &Job,
        cache: &ScanCache,
        window: &RateLimitWindow,
    ) -> Result<(), AuditError> {
        let store_id = job.payload.store_job_id;
        let url = job.payload.url.as_str();

        if let Reachability::Unreachable { reason } = self.prechecker.check(url).await {
            warn!("Precheck failed for {}: {}", url, reason);
            self.persist(store_id, AuditStatus::Failed, AuditUpdate::message(reason.clone()))
                .await;
            return Err(AuditError::Unrecoverable(reason));
        }

        let result = self.scan_and_analyze(store_id, url, cache, window).await;

        if let Err(AuditError::RateLimited { retry_after, .. }) = &result {
            let advisory = match retry_after {
                Some(hint) if !hint.is_zero() => format!(
                    "Rate limited by analysis service. Will retry in ~{}s...",
                    hint.as_secs()
                ),
                _ => "Rate limited by analysis service. Will retry shortly...".to_string(),
            };
            self.persist(store_id, AuditStatus::Analyzing, AuditUpdate::message(advisory))
                .await;
        }

        result
    }

    async fn scan_and_analyze(
        &self,
        store_id: Uuid,
        url: &str,
        cache: &ScanCache,
        window: &RateLimitWindow,
    ) -> Result<(), AuditError> {
        let cached = cache.get(&store_id);

        if cached.is_none() {
            if let Some(hint) = window.remaining_hint() {
                info!("Global cooldown active, deferring scan for {}s", hint.as_secs());
                return Err(AuditError::rate_limited(
                    "Deferred due to global rate-limit cooldown",
                    Some(hint),
                ));
            }
        }

        let scan = match cached {
            Some(scan) => {
                info!("Reusing cached scan for {}", url);
                metrics::counter!(SCAN_CACHE_HITS).increment(1);
                scan
            }
            None => {
                let scan = self.scan(store_id, url).await?;
                cache.insert(store_id, scan.clone());
                scan
            }
        };

        if let Some(hint) = window.remaining_hint() {
            info!("Global cooldown active, deferring analysis for {}s", hint.as_secs());
            return Err(AuditError::rate_limited(
                "Deferred due to global rate-limit cooldown",
                Some(hint),
            ));
        }

        self.update(store_id, AuditStatus::Analyzing, AuditUpdate::default())
            .await?;

        let analysis = match self.analysis.analyze(&scan).await {
            Ok(analysis) => analysis,
            Err(AnalysisError::RateLimited {
                retry_after_seconds,
            }) => {
                let hint = retry_after_seconds
                    .filter(|secs| *secs > 0)
                    .map(|secs| Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)));
                window.extend(hint.unwrap_or(self.default_cooldown));
                return Err(AuditError::rate_limited("Analysis HTTP 429", hint));
            }
            Err(e) => {
                error!("Analysis failed for {}: {}", url, e);
                return Err(AuditError::transient(format!("Analysis failed: {}", e)));
            }
        };

        let report = self.assembler.assemble(&scan, &analysis);
        let results = serde_json::to_value(&report)
            .map_err(|e| AuditError::transient(format!("Failed to encode report: {}", e)))?;
        let analysis_data = serde_json::to_value(&analysis)
            .map_err(|e| AuditError::transient(format!("Failed to encode analysis: {}", e)))?;

        self.update(
            store_id,
            AuditStatus::Completed,
            AuditUpdate::completed(results, analysis_data),
        )
        .await?;
        cache.remove(&store_id);

        info!(
            "Audit completed for {} with {} findings, health score {}",
            url,
            analysis.audit_findings.len(),
            report.health_score
        );
        Ok(())
    }

    async fn scan(&self, store_id: Uuid, url: &str) -> Result<ScanResult, AuditError> {
        self.update(store_id, AuditStatus::Scanning, AuditUpdate::default())
            .await?;

        info!("Starting {} scan for {}", self.engine.name(), url);
        let scan = self
            .engine
            .scan(url)
            .await
            .map_err(|e| AuditError::transient(format!("Scan failed: {}", e)))?;

        if scan.has_errors() {
            let errors = scan.errors.unwrap_or_default();
            return Err(AuditError::transient(format!(
                "Scan failed: {}",
                errors.join(", ")
            )));
        }
        Ok(scan)
    }

    async fn update(
        &self,
        store_id: Uuid,
        status: AuditStatus,
        update: AuditUpdate,
    ) -> Result<(), AuditError> {
        self.repository
            .update_status(store_id, status, update)
            .await
            .map_err(|e| {
                AuditError::transient(format!("Failed to update job status to {}: {}", status, e))
            })
    }

    /// 失败路径上的状态写入；写入失败只记录日志，不覆盖原错误
    async fn persist(&self, store_id: Uuid, status: AuditStatus, update: AuditUpdate) {
        if let Err(e) = self.repository.update_status(store_id, status, update).await {
            error!("Failed to persist {} status for {}: {}", status, store_id, e);
        }
    }
}
