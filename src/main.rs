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

use auditrs::config::settings::Settings;
use auditrs::domain::repositories::audit_job_repository::AuditJobRepository;
use auditrs::domain::services::health_scorer::HealthScorer;
use auditrs::domain::services::report_assembler::ReportAssembler;
use auditrs::engines::chromium_engine::ChromiumScanEngine;
use auditrs::infrastructure::repositories::audit_job_repo_impl::InMemoryAuditJobRepository;
use auditrs::infrastructure::services::analysis_client::HttpAnalysisClient;
use auditrs::presentation::routes;
use auditrs::queue::scheduler::AuditScheduler;
use auditrs::utils::reachability::DnsPrechecker;
use auditrs::utils::telemetry;
use auditrs::workers::AuditPipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting auditrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.metrics.enabled {
        auditrs::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);
    }

    // 3. Initialize components
    let repository: Arc<dyn AuditJobRepository> = Arc::new(InMemoryAuditJobRepository::new());
    let engine = Arc::new(ChromiumScanEngine::new(settings.scan.clone()));
    let analysis = Arc::new(HttpAnalysisClient::new(
        &settings.analysis.base_url,
        Duration::from_secs(settings.analysis.timeout_secs),
    )?);
    info!("Analysis service endpoint: {}", analysis.endpoint());
    let prechecker = Arc::new(DnsPrechecker::new(Duration::from_millis(
        settings.precheck.timeout_ms,
    )));

    let scorer = HealthScorer::new(settings.scoring.tag_aliases.clone().unwrap_or_default());
    let policy = settings.queue_policy();
    let pipeline = AuditPipeline::new(
        repository.clone(),
        engine,
        analysis,
        prechecker,
        ReportAssembler::new(scorer),
        policy.global_cooldown,
    );
    let scheduler = AuditScheduler::new(pipeline, policy);

    // 4. Start HTTP server
    let app = routes::app(repository, scheduler);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
