// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 扫描结果
///
/// 浏览器扫描阶段的输出，也是发送给分析服务的请求体（camelCase 字段）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// 扫描的URL
    pub url: String,
    /// 扫描完成时间
    pub timestamp: DateTime<Utc>,
    /// 页面中的脚本标签
    #[serde(default)]
    pub detected_scripts: Vec<DetectedScript>,
    /// 识别出的营销/统计标签
    #[serde(default)]
    pub injected_tags: Vec<InjectedTag>,
    /// 观察到的网络请求（采集时已截断）
    #[serde(default)]
    pub network_requests: Vec<NetworkRequest>,
    /// 性能指标
    #[serde(default)]
    pub performance_metrics: PerformanceMetrics,
    /// 采集过程中的错误
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ScanResult {
    /// 创建一个空的扫描结果
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            detected_scripts: Vec::new(),
            injected_tags: Vec::new(),
            network_requests: Vec::new(),
            performance_metrics: PerformanceMetrics::default(),
            errors: None,
        }
    }

    /// 扫描是否带有采集错误
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// 记录一条采集错误
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.get_or_insert_with(Vec::new).push(message.into());
    }
}

/// 脚本类型：外链或内联
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Script,
    Inline,
}

/// 脚本位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLocation {
    Head,
    Body,
}

/// 页面中检测到的脚本标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedScript {
    /// 脚本地址，内联脚本为空字符串
    #[serde(default)]
    pub src: String,
    #[serde(rename = "type")]
    pub kind: ScriptKind,
    pub location: ScriptLocation,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default)]
    pub defer: bool,
}

/// 标签类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    #[serde(rename = "GTM")]
    Gtm,
    #[serde(rename = "GA4")]
    Ga4,
    MetaPixel,
    LinkedIn,
    TikTok,
    Twitter,
    Pinterest,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TagKind::Gtm => write!(f, "GTM"),
            TagKind::Ga4 => write!(f, "GA4"),
            TagKind::MetaPixel => write!(f, "MetaPixel"),
            TagKind::LinkedIn => write!(f, "LinkedIn"),
            TagKind::TikTok => write!(f, "TikTok"),
            TagKind::Twitter => write!(f, "Twitter"),
            TagKind::Pinterest => write!(f, "Pinterest"),
        }
    }
}

/// 识别出的标签（容器ID、衡量ID或像素ID）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedTag {
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub id: String,
    pub status: String,
}

impl InjectedTag {
    pub fn found(kind: TagKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            status: "found".to_string(),
        }
    }
}

/// 网络请求记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub url: String,
    /// 资源类型（script、xhr、fetch、img 等）
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub initiator: String,
}

/// 页面性能指标（毫秒）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub load_time_ms: f64,
    #[serde(default)]
    pub dom_content_loaded_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_contentful_paint_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub largest_contentful_paint_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_layout_shift: Option<f64>,
}
