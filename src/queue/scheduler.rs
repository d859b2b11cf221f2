// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_job::{AuditStatus, AuditUpdate};
use crate::domain::models::job::{Job, JobSnapshot};
use crate::infrastructure::metrics::{
    JOBS_COMPLETED, JOBS_ENQUEUED, JOBS_FAILED, JOBS_RETRIED, QUEUE_LENGTH,
};
use crate::queue::backoff::RetryPolicy;
use crate::queue::rate_limit_window::RateLimitWindow;
use crate::queue::scan_cache::ScanCache;
use crate::utils::errors::AuditError;
use crate::workers::audit_pipeline::AuditPipeline;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 队列状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// 队列中等待的任务数
    pub queue_length: usize,
    /// 是否有流水线正在执行
    pub is_processing: bool,
    /// 等待重试计时器的任务数
    pub scheduled_retries: usize,
    /// 队列中任务的快照
    pub jobs: Vec<JobSnapshot>,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    processing: bool,
    scheduled_retries: usize,
}

struct Inner {
    state: Mutex<QueueState>,
    pipeline: AuditPipeline,
    policy: RetryPolicy,
    cache: ScanCache,
    window: RateLimitWindow,
}

/// 审计任务调度器
///
/// 同一时刻最多执行一个流水线。新任务追加到队尾，失败重试在延迟后
/// 插回队首；所有队列操作都在同一把锁下完成。
#[derive(Clone)]
pub struct AuditScheduler {
    inner: Arc<Inner>,
}

impl AuditScheduler {
    /// 创建新的调度器实例
    ///
    /// # 参数
    ///
    /// * `pipeline` - 审计流水线
    /// * `policy` - 重试策略
    pub fn new(pipeline: AuditPipeline, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                pipeline,
                policy,
                cache: ScanCache::new(),
                window: RateLimitWindow::new(),
            }),
        }
    }

    /// 加入新的审计任务，空闲时立即开始处理
    ///
    /// 必须在 tokio 运行时内调用；不会等待流水线。
    pub fn enqueue(&self, store_job_id: Uuid, url: impl Into<String>) -> String {
        let job = Job::audit(store_job_id, url);
        let job_id = job.id.clone();
        {
            let mut state = self.inner.state.lock();
            state.jobs.push_back(job);
            metrics::gauge!(QUEUE_LENGTH).set(state.jobs.len() as f64);
        }
        metrics::counter!(JOBS_ENQUEUED).increment(1);
        info!("Enqueued audit job {} for record {}", job_id, store_job_id);

        Inner::kick(&self.inner);
        job_id
    }

    /// 队列监控信息
    pub fn status(&self) -> QueueStatus {
        let state = self.inner.state.lock();
        QueueStatus {
            queue_length: state.jobs.len(),
            is_processing: state.processing,
            scheduled_retries: state.scheduled_retries,
            jobs: state.jobs.iter().map(Job::snapshot).collect(),
        }
    }

    pub fn scan_cache(&self) -> &ScanCache {
        &self.inner.cache
    }

    pub fn rate_limit_window(&self) -> &RateLimitWindow {
        &self.inner.window
    }
}

impl Inner {
    /// 队列非空且空闲时启动处理循环
    fn kick(inner: &Arc<Inner>) {
        {
            let mut state = inner.state.lock();
            if state.processing || state.jobs.is_empty() {
                return;
            }
            state.processing = true;
        }
        tokio::spawn(Inner::drain(inner.clone()));
    }

    async fn drain(inner: Arc<Inner>) {
        loop {
            let job = {
                let mut state = inner.state.lock();
                match state.jobs.pop_front() {
                    Some(job) => {
                        metrics::gauge!(QUEUE_LENGTH).set(state.jobs.len() as f64);
                        job
                    }
                    None => {
                        state.processing = false;
                        break;
                    }
                }
            };

            info!("Processing job {} (retry {})", job.id, job.retry_count());
            // A panicking run must not take the drain loop down with it
            let run = {
                let inner = inner.clone();
                let job = job.clone();
                tokio::spawn(async move {
                    inner.pipeline.run(&job, &inner.cache, &inner.window).await
                })
            };
            match run.await {
                Ok(Ok(())) => {
                    metrics::counter!(JOBS_COMPLETED).increment(1);
                }
                Ok(Err(e)) => inner.handle_failure(job, e).await,
                Err(e) => {
                    error!("Pipeline task for job {} aborted: {}", job.id, e);
                    let error = AuditError::transient(format!("Pipeline task aborted: {}", e));
                    inner.handle_failure(job, error).await;
                }
            }
        }
        info!("Job queue processing completed");
    }

    async fn handle_failure(self: &Arc<Self>, mut job: Job, error: AuditError) {
        let store_id = job.payload.store_job_id;
        let max_retries = self.policy.max_retries;

        if error.is_unrecoverable() {
            job.exhaust(max_retries);
            warn!("Job {} failed without retry: {}", job.id, error);
            self.cache.remove(&store_id);
            metrics::counter!(JOBS_FAILED).increment(1);
            return;
        }

        let retry_count = job.record_failure();
        if self.policy.should_retry(retry_count) {
            let delay = self.policy.delay_for(&error, retry_count);
            warn!(
                "Job {} failed ({}), retry {}/{} in {}ms",
                job.id,
                error,
                retry_count,
                max_retries,
                delay.as_millis()
            );
            metrics::counter!(JOBS_RETRIED, "reason" => error.reason()).increment(1);
            self.schedule_retry(job, delay);
            return;
        }

        error!("Job {} failed permanently after {} retries: {}", job.id, max_retries, error);
        let message = format!("Job processing failed after {} retries: {}", max_retries, error);
        if let Err(e) = self
            .pipeline
            .repository()
            .update_status(store_id, AuditStatus::Failed, AuditUpdate::message(message))
            .await
        {
            error!("Failed to update job status in store: {}", e);
        }
        self.cache.remove(&store_id);
        metrics::counter!(JOBS_FAILED).increment(1);
    }

    /// 延迟后把任务插回队首并唤醒处理循环
    fn schedule_retry(self: &Arc<Self>, job: Job, delay: std::time::Duration) {
        self.state.lock().scheduled_retries += 1;

        let inner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = inner.state.lock();
                state.scheduled_retries = state.scheduled_retries.saturating_sub(1);
                state.jobs.push_front(job);
                metrics::gauge!(QUEUE_LENGTH).set(state.jobs.len() as f64);
            }
            Inner::kick(&inner);
        });
    }
}
