// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 审计记录状态
///
/// 状态转换遵循以下流程：
/// Pending → Scanning → Analyzing → Completed/Failed
///
/// 限流延后时 Analyzing 可以重新进入自身（仅附加提示信息）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// 已提交，尚未开始处理
    #[default]
    Pending,
    /// 正在执行浏览器扫描
    Scanning,
    /// 正在等待远程分析服务
    Analyzing,
    /// 已完成，报告可用
    Completed,
    /// 已失败
    Failed,
}

impl AuditStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuditStatus::Completed | AuditStatus::Failed)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuditStatus::Pending => write!(f, "pending"),
            AuditStatus::Scanning => write!(f, "scanning"),
            AuditStatus::Analyzing => write!(f, "analyzing"),
            AuditStatus::Completed => write!(f, "completed"),
            AuditStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AuditStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuditStatus::Pending),
            "scanning" => Ok(AuditStatus::Scanning),
            "analyzing" => Ok(AuditStatus::Analyzing),
            "completed" => Ok(AuditStatus::Completed),
            "failed" => Ok(AuditStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 审计记录
///
/// 由任务存储持有的持久化记录，核心流水线只通过按ID更新的接口修改它。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// 存储层任务ID
    pub id: Uuid,
    /// 被审计的URL
    pub url: String,
    /// 当前状态
    pub status: AuditStatus,
    /// 最终报告（仅在完成时存在）
    pub results: Option<serde_json::Value>,
    /// 分析服务返回的原始数据
    pub analysis_data: Option<serde_json::Value>,
    /// 失败原因或限流提示
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditRecord {
    /// 创建一条新的待处理记录
    pub fn new(url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            status: AuditStatus::Pending,
            results: None,
            analysis_data: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 状态更新时附带的可选字段
///
/// `updated_at` 由存储层在每次更新时写入。
#[derive(Debug, Clone, Default)]
pub struct AuditUpdate {
    pub results: Option<serde_json::Value>,
    pub analysis_data: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

impl AuditUpdate {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn completed(results: serde_json::Value, analysis_data: serde_json::Value) -> Self {
        Self {
            results: Some(results),
            analysis_data: Some(analysis_data),
            error_message: None,
        }
    }
}
