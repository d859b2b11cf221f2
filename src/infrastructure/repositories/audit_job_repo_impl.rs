// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_job::{AuditRecord, AuditStatus, AuditUpdate};
use crate::domain::repositories::audit_job_repository::{AuditJobRepository, RepositoryError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// 内存审计记录仓库
///
/// 进程内实现，重启后数据丢失。
#[derive(Default)]
pub struct InMemoryAuditJobRepository {
    records: DashMap<Uuid, AuditRecord>,
}

impl InMemoryAuditJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AuditJobRepository for InMemoryAuditJobRepository {
    async fn create(&self, url: &str) -> Result<AuditRecord, RepositoryError> {
        let record = AuditRecord::new(url);
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditRecord>, RepositoryError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<AuditRecord>, RepositoryError> {
        let mut records: Vec<AuditRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AuditStatus,
        update: AuditUpdate,
    ) -> Result<(), RepositoryError> {
        let mut record = self.records.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        record.status = status;
        if let Some(results) = update.results {
            record.results = Some(results);
        }
        if let Some(analysis_data) = update.analysis_data {
            record.analysis_data = Some(analysis_data);
        }
        // A completed record drops any advisory left over from a deferred attempt
        if update.error_message.is_some() || status == AuditStatus::Completed {
            record.error_message = update.error_message;
        }
        record.updated_at = Utc::now();

        debug!(audit_id = %id, status = %status, "Audit record updated");
        Ok(())
    }
}
