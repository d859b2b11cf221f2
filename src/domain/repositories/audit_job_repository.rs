// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_job::{AuditRecord, AuditStatus, AuditUpdate};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储后端错误
    #[error("Storage error: {0}")]
    Storage(String),
}

/// 审计记录仓库特质
///
/// 每次状态变化都是一次原子的按ID更新
#[async_trait]
pub trait AuditJobRepository: Send + Sync {
    /// 创建新的待处理记录
    async fn create(&self, url: &str) -> Result<AuditRecord, RepositoryError>;
    /// 根据ID查找记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditRecord>, RepositoryError>;
    /// 按创建时间倒序列出最近的记录
    async fn list(&self, limit: usize) -> Result<Vec<AuditRecord>, RepositoryError>;
    /// 更新状态及可选字段
    async fn update_status(
        &self,
        id: Uuid,
        status: AuditStatus,
        update: AuditUpdate,
    ) -> Result<(), RepositoryError>;
}
