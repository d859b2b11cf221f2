use async_trait::async_trait;
use auditrs::domain::models::analysis_result::AnalysisResult;
use auditrs::domain::models::audit_job::{AuditRecord, AuditStatus, AuditUpdate};
use auditrs::domain::models::scan_result::{InjectedTag, ScanResult, TagKind};
use auditrs::domain::repositories::audit_job_repository::{AuditJobRepository, RepositoryError};
use auditrs::domain::services::analysis_service::{AnalysisError, AnalysisService};
use auditrs::domain::services::health_scorer::HealthScorer;
use auditrs::domain::services::report_assembler::ReportAssembler;
use auditrs::engines::traits::{EngineError, ScanEngine};
use auditrs::infrastructure::repositories::audit_job_repo_impl::InMemoryAuditJobRepository;
use auditrs::queue::backoff::RetryPolicy;
use auditrs::queue::scheduler::AuditScheduler;
use auditrs::utils::reachability::{Reachability, ReachabilityCheck};
use auditrs::workers::AuditPipeline;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// 可编排结果的扫描引擎，同时记录并发度
#[derive(Default)]
pub struct FakeScanEngine {
    scripted: Mutex<VecDeque<Result<ScanResult, EngineError>>>,
    pub calls: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub delay: Duration,
}

impl FakeScanEngine {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn push(&self, result: Result<ScanResult, EngineError>) {
        self.scripted.lock().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn healthy_scan(url: &str) -> ScanResult {
    let mut scan = ScanResult::empty(url);
    scan.injected_tags = vec![InjectedTag::found(TagKind::Ga4, "G-TEST123")];
    scan
}

pub fn broken_scan(url: &str, error: &str) -> ScanResult {
    let mut scan = ScanResult::empty(url);
    scan.push_error(error);
    scan
}

#[async_trait]
impl ScanEngine for FakeScanEngine {
    async fn scan(&self, url: &str) -> Result<ScanResult, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.scripted.lock().pop_front();

        self.active.fetch_sub(1, Ordering::SeqCst);
        scripted.unwrap_or_else(|| Ok(healthy_scan(url)))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 可编排结果的分析服务，记录每次调用的时间
#[derive(Default)]
pub struct FakeAnalysisService {
    scripted: Mutex<VecDeque<Result<AnalysisResult, AnalysisError>>>,
    pub call_times: Mutex<Vec<Instant>>,
}

impl FakeAnalysisService {
    pub fn push(&self, result: Result<AnalysisResult, AnalysisError>) {
        self.scripted.lock().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.call_times.lock().len()
    }
}

pub fn analysis_ok() -> AnalysisResult {
    serde_json::from_value(json!({
        "auditFindings": [{"severity": "high", "type": "issue", "description": "GA4 fires twice"}],
        "performanceScores": {"loadTimeMs": 1200.0},
        "processedTags": [{"name": "Google Analytics 4", "type": "analytics"}],
        "auditSummary": {"totalFindings": 1}
    }))
    .unwrap()
}

#[async_trait]
impl AnalysisService for FakeAnalysisService {
    async fn analyze(&self, _scan: &ScanResult) -> Result<AnalysisResult, AnalysisError> {
        self.call_times.lock().push(Instant::now());
        self.scripted
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(analysis_ok()))
    }
}

/// 指定主机不可达的预检
#[derive(Default)]
pub struct FakeReachability {
    pub unreachable_hosts: HashSet<String>,
}

#[async_trait]
impl ReachabilityCheck for FakeReachability {
    async fn check(&self, url: &str) -> Reachability {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        match host {
            None => Reachability::Unreachable {
                reason: "Invalid URL format".to_string(),
            },
            Some(host) if self.unreachable_hosts.contains(&host) => Reachability::Unreachable {
                reason: format!("DNS resolution failed (no addresses for {})", host),
            },
            Some(host) => Reachability::Reachable { host },
        }
    }
}

/// 记录每次状态写入的仓库
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryAuditJobRepository,
    history: Mutex<Vec<(Uuid, AuditStatus)>>,
}

impl RecordingRepository {
    pub fn history_for(&self, id: Uuid) -> Vec<AuditStatus> {
        self.history
            .lock()
            .iter()
            .filter(|(record_id, _)| *record_id == id)
            .map(|(_, status)| *status)
            .collect()
    }

    /// 按写入顺序列出进入某状态的记录
    pub fn ids_reaching(&self, status: AuditStatus) -> Vec<Uuid> {
        self.history
            .lock()
            .iter()
            .filter(|(_, s)| *s == status)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[async_trait]
impl AuditJobRepository for RecordingRepository {
    async fn create(&self, url: &str) -> Result<AuditRecord, RepositoryError> {
        self.inner.create(url).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditRecord>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<AuditRecord>, RepositoryError> {
        self.inner.list(limit).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AuditStatus,
        update: AuditUpdate,
    ) -> Result<(), RepositoryError> {
        self.history.lock().push((id, status));
        self.inner.update_status(id, status, update).await
    }
}

pub struct Harness {
    pub repository: Arc<RecordingRepository>,
    pub engine: Arc<FakeScanEngine>,
    pub analysis: Arc<FakeAnalysisService>,
    pub scheduler: AuditScheduler,
}

impl Harness {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::build(policy, FakeScanEngine::default(), FakeReachability::default())
    }

    pub fn build(
        policy: RetryPolicy,
        engine: FakeScanEngine,
        reachability: FakeReachability,
    ) -> Self {
        let repository = Arc::new(RecordingRepository::default());
        let engine = Arc::new(engine);
        let analysis = Arc::new(FakeAnalysisService::default());
        let pipeline = AuditPipeline::new(
            repository.clone(),
            engine.clone(),
            analysis.clone(),
            Arc::new(reachability),
            ReportAssembler::new(HealthScorer::default()),
            policy.global_cooldown,
        );
        let scheduler = AuditScheduler::new(pipeline, policy);
        Self {
            repository,
            engine,
            analysis,
            scheduler,
        }
    }

    /// 创建记录并加入队列
    pub async fn submit(&self, url: &str) -> Uuid {
        let record = self.repository.create(url).await.unwrap();
        self.scheduler.enqueue(record.id, url);
        record.id
    }

    pub async fn record(&self, id: Uuid) -> AuditRecord {
        self.repository.find_by_id(id).await.unwrap().unwrap()
    }

    /// 轮询直到记录满足条件
    pub async fn wait_for<F>(&self, id: Uuid, limit: Duration, predicate: F) -> AuditRecord
    where
        F: Fn(&AuditRecord) -> bool,
    {
        let deadline = Instant::now() + limit;
        loop {
            let record = self.record(id).await;
            if predicate(&record) {
                return record;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting, last state: {:?} {:?}",
                record.status,
                record.error_message
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_status(&self, id: Uuid, status: AuditStatus, limit: Duration) -> AuditRecord {
        self.wait_for(id, limit, |r| r.status == status).await
    }

    /// 等待调度器完全空闲（无排队、无计时器、无执行中）
    pub async fn wait_idle(&self, limit: Duration) {
        let deadline = Instant::now() + limit;
        loop {
            let status = self.scheduler.status();
            if !status.is_processing && status.queue_length == 0 && status.scheduled_retries == 0 {
                return;
            }
            assert!(Instant::now() < deadline, "scheduler never went idle: {:?}", status);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        ..RetryPolicy::default()
    }
}
