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

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::{
        audit_request::{AuditListQuery, AuditRequestDto},
        audit_response::{AuditCreatedDto, AuditListDto, AuditResultsDto, AuditStatusDto},
    },
    domain::models::audit_job::{AuditRecord, AuditStatus},
    domain::repositories::audit_job_repository::AuditJobRepository,
    presentation::errors::{ApiError, AppError},
    queue::scheduler::AuditScheduler,
};

/// 创建审计任务
///
/// 写入待处理记录后加入调度队列，立即返回 202。
pub async fn create_audit(
    Extension(repository): Extension<Arc<dyn AuditJobRepository>>,
    Extension(scheduler): Extension<AuditScheduler>,
    Json(payload): Json<AuditRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = repository.create(&payload.url).await?;
    let queue_job_id = scheduler.enqueue(record.id, record.url.clone());
    info!("Audit {} accepted as {}", record.id, queue_job_id);

    let response = AuditCreatedDto {
        success: true,
        job_id: record.id,
        status: record.status,
        url: record.url,
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// 审计历史，最新的在前
pub async fn list_audits(
    Query(query): Query<AuditListQuery>,
    Extension(repository): Extension<Arc<dyn AuditJobRepository>>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let audits: Vec<AuditStatusDto> = repository
        .list(query.limit())
        .await?
        .into_iter()
        .map(AuditStatusDto::from)
        .collect();
    Ok(Json(AuditListDto {
        success: true,
        count: audits.len(),
        audits,
    }))
}

/// 查询审计状态
pub async fn get_audit(
    Path(id): Path<Uuid>,
    Extension(repository): Extension<Arc<dyn AuditJobRepository>>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(repository.as_ref(), id).await?;
    Ok(Json(AuditStatusDto::from(record)))
}

/// 获取审计报告
///
/// 任务未完成时返回 409。
pub async fn get_audit_results(
    Path(id): Path<Uuid>,
    Extension(repository): Extension<Arc<dyn AuditJobRepository>>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(repository.as_ref(), id).await?;

    match (record.status, record.results) {
        (AuditStatus::Completed, Some(results)) => Ok(Json(AuditResultsDto {
            success: true,
            job_id: record.id,
            results,
            analysis_data: record.analysis_data,
        })),
        (status, _) => Err(ApiError::Conflict(format!(
            "Audit results are not available (status: {})",
            status
        ))
        .into()),
    }
}

/// 队列监控信息
pub async fn queue_status(Extension(scheduler): Extension<AuditScheduler>) -> impl IntoResponse {
    Json(scheduler.status())
}

async fn find_record(
    repository: &dyn AuditJobRepository,
    id: Uuid,
) -> Result<AuditRecord, AppError> {
    repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Audit job {} not found", id)).into())
}
