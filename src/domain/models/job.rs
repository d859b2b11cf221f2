// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// 队列任务类型
///
/// 当前只处理审计任务。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[default]
    Audit,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobKind::Audit => write!(f, "audit"),
        }
    }
}

/// 审计任务负载
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPayload {
    /// 存储层记录ID
    pub store_job_id: Uuid,
    pub url: String,
}

/// 内存队列中的任务
///
/// 只存在于进程内；重试时重新插入的是同一个逻辑任务，`retry_count` 只增不减。
#[derive(Debug, Clone)]
pub struct Job {
    /// 队列内ID，与存储层ID不同
    pub id: String,
    pub kind: JobKind,
    pub payload: AuditPayload,
    pub created_at: DateTime<Utc>,
    retry_count: u32,
}

impl Job {
    pub fn audit(store_job_id: Uuid, url: impl Into<String>) -> Self {
        let created_at = Utc::now();
        Self {
            id: format!("audit_{}_{}", store_job_id, created_at.timestamp_millis()),
            kind: JobKind::Audit,
            payload: AuditPayload {
                store_job_id,
                url: url.into(),
            },
            created_at,
            retry_count: 0,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// 记录一次失败，返回新的重试次数
    pub fn record_failure(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }

    /// 不可恢复错误：直接把重试次数推到上限
    pub fn exhaust(&mut self, max_retries: u32) {
        self.retry_count = self.retry_count.max(max_retries);
    }

    /// 监控用快照，不包含URL等负载字段
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            created_at: self.created_at,
            retry_count: self.retry_count,
        }
    }
}

/// 任务监控快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
}
