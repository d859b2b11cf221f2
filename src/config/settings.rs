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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::services::health_scorer::TagVocabulary;
use crate::queue::backoff::RetryPolicy;

/// 应用程序配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 队列与重试配置
    pub queue: QueueSettings,
    /// 分析服务配置
    pub analysis: AnalysisSettings,
    /// 可达性预检配置
    pub precheck: PrecheckSettings,
    /// 浏览器扫描配置
    pub scan: ScanSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
    /// 健康分配置
    #[serde(default)]
    pub scoring: ScoringSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// 队列与重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// 最大重试次数
    pub max_retries: u32,
    /// 普通失败的线性退避基数（毫秒）
    pub base_backoff_ms: u64,
    /// 无 Retry-After 的限流退避基数（毫秒）
    pub rate_limit_backoff_base_ms: u64,
    /// 限流退避上限（毫秒）
    pub rate_limit_backoff_max_ms: u64,
    /// 全局限流冷却时间（毫秒）
    pub rate_limit_global_cooldown_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff_ms: 5000,
            rate_limit_backoff_base_ms: 15000,
            rate_limit_backoff_max_ms: 120000,
            rate_limit_global_cooldown_ms: 60000,
        }
    }
}

impl QueueSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            rate_limit_backoff_base: Duration::from_millis(self.rate_limit_backoff_base_ms),
            rate_limit_backoff_max: Duration::from_millis(self.rate_limit_backoff_max_ms),
            global_cooldown: Duration::from_millis(self.rate_limit_global_cooldown_ms),
        }
    }
}

/// 分析服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// 服务基础地址
    pub base_url: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 40,
        }
    }
}

/// 预检配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PrecheckSettings {
    pub timeout_ms: u64,
}

impl Default for PrecheckSettings {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// 浏览器扫描配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// 单次扫描总超时（秒）
    pub timeout_secs: u64,
    /// 页面加载后的等待时间（毫秒）
    pub settle_ms: u64,
    /// 采集的网络请求上限
    pub max_network_requests: usize,
    /// 远程 Chrome 调试地址
    pub chromium_remote_url: Option<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            settle_ms: 2000,
            max_network_requests: 500,
            chromium_remote_url: None,
        }
    }
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "0.0.0.0:9000".to_string(),
        }
    }
}

/// 健康分配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    /// 覆盖默认的标签加分词表
    pub tag_aliases: Option<TagVocabulary>,
}

/// 兼容旧部署使用的扁平环境变量
const LEGACY_NUMERIC_VARS: &[(&str, &str)] = &[
    ("MAX_RETRIES", "queue.max_retries"),
    ("BASE_BACKOFF_MS", "queue.base_backoff_ms"),
    ("RATE_LIMIT_BACKOFF_BASE_MS", "queue.rate_limit_backoff_base_ms"),
    ("RATE_LIMIT_BACKOFF_MAX_MS", "queue.rate_limit_backoff_max_ms"),
    ("RATE_LIMIT_GLOBAL_COOLDOWN_MS", "queue.rate_limit_global_cooldown_ms"),
];
/// 分析服务地址，按顺序取第一个非空值
const LEGACY_ANALYSIS_URL_VARS: &[&str] = &["ANALYSIS_SERVICE_URL", "PYTHON_SERVICE_URL"];

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件和环境变量加载配置
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("AUDITRS").separator("__"));
        let builder = apply_legacy_overrides(builder, |key| std::env::var(key).ok())?;

        builder.build()?.try_deserialize::<Settings>().map(Settings::normalized)
    }

    /// 从指定配置文件加载（不读取环境变量）
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize::<Settings>()
            .map(Settings::normalized)
    }

    /// 调度器使用的重试策略
    pub fn queue_policy(&self) -> RetryPolicy {
        self.queue.retry_policy()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let queue = QueueSettings::default();
        let analysis = AnalysisSettings::default();
        let scan = ScanSettings::default();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("queue.max_retries", queue.max_retries as u64)?
            .set_default("queue.base_backoff_ms", queue.base_backoff_ms)?
            .set_default("queue.rate_limit_backoff_base_ms", queue.rate_limit_backoff_base_ms)?
            .set_default("queue.rate_limit_backoff_max_ms", queue.rate_limit_backoff_max_ms)?
            .set_default(
                "queue.rate_limit_global_cooldown_ms",
                queue.rate_limit_global_cooldown_ms,
            )?
            .set_default("analysis.base_url", analysis.base_url)?
            .set_default("analysis.timeout_secs", analysis.timeout_secs)?
            .set_default("precheck.timeout_ms", 5000)?
            .set_default("scan.timeout_secs", scan.timeout_secs)?
            .set_default("scan.settle_ms", scan.settle_ms)?
            .set_default("scan.max_network_requests", scan.max_network_requests as u64)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    fn normalized(mut self) -> Self {
        self.analysis.base_url = self.analysis.base_url.trim().trim_end_matches('/').to_string();
        self
    }
}

/// 应用扁平环境变量覆盖
///
/// 非数字或为0的值忽略，保持默认值。
fn apply_legacy_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in LEGACY_NUMERIC_VARS {
        let value = lookup(var)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|v| *v > 0);
        builder = builder.set_override_option(*key, value)?;
    }

    let url = LEGACY_ANALYSIS_URL_VARS.iter().find_map(|var| {
        lookup(var)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    });
    builder.set_override_option("analysis.base_url", url)
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
