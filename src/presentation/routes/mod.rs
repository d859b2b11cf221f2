// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::audit_job_repository::AuditJobRepository;
use crate::presentation::handlers::audit_handler;
use crate::queue::scheduler::AuditScheduler;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// 依赖通过 `Extension` 层注入：`Arc<dyn AuditJobRepository>` 与 `AuditScheduler`。
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let audit_routes = Router::new()
        .route(
            "/v1/audits",
            post(audit_handler::create_audit).get(audit_handler::list_audits),
        )
        .route("/v1/audits/{id}", get(audit_handler::get_audit))
        .route("/v1/audits/{id}/results", get(audit_handler::get_audit_results))
        .route("/v1/queue", get(audit_handler::queue_status));

    Router::new().merge(public_routes).merge(audit_routes)
}

/// 创建注入了依赖的完整应用
pub fn app(repository: Arc<dyn AuditJobRepository>, scheduler: AuditScheduler) -> Router {
    routes()
        .layer(Extension(repository))
        .layer(Extension(scheduler))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
