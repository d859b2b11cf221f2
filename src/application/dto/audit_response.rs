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

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::audit_job::{AuditRecord, AuditStatus};

/// 创建审计的响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCreatedDto {
    pub success: bool,
    pub job_id: Uuid,
    pub status: AuditStatus,
    pub url: String,
}

/// 审计状态视图，不包含完整报告
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatusDto {
    pub success: bool,
    pub job_id: Uuid,
    pub url: String,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub has_results: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AuditRecord> for AuditStatusDto {
    fn from(record: AuditRecord) -> Self {
        Self {
            success: true,
            job_id: record.id,
            url: record.url,
            status: record.status,
            error_message: record.error_message,
            has_results: record.results.is_some(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// 审计历史列表
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListDto {
    pub success: bool,
    pub count: usize,
    pub audits: Vec<AuditStatusDto>,
}

/// 已完成审计的结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResultsDto {
    pub success: bool,
    pub job_id: Uuid,
    pub results: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<Value>,
}
