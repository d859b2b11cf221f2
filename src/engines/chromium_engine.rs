// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScanSettings;
use crate::domain::models::scan_result::{
    DetectedScript, NetworkRequest, PerformanceMetrics, ScanResult,
};
use crate::engines::tag_detector::detect_tags;
use crate::engines::traits::{EngineError, ScanEngine};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 统计/广告相关请求域名
const TRACKING_REQUEST_DOMAINS: &[&str] = &[
    "googletagmanager.com",
    "google-analytics.com",
    "facebook.net",
    "linkedin.com",
    "tiktok.com",
    "twitter.com",
    "pinterest.com",
    "doubleclick.net",
    "hotjar.com",
    "segment.com",
    "mixpanel.com",
    "amplitude.com",
];

const SCRIPTS_PROBE: &str = r#"Array.from(document.querySelectorAll('script')).map(s => ({
    src: s.src || '',
    type: s.src ? 'script' : 'inline',
    location: s.closest('head') ? 'head' : 'body',
    async: !!s.async,
    defer: !!s.defer
}))"#;

const PERFORMANCE_PROBE: &str = r#"(() => {
    const nav = performance.getEntriesByType('navigation')[0];
    const fcp = performance.getEntriesByType('paint').find(e => e.name === 'first-contentful-paint');
    const lcp = performance.getEntriesByType('largest-contentful-paint').slice(-1)[0];
    const cls = performance.getEntriesByType('layout-shift').reduce((sum, e) => sum + (e.value || 0), 0);
    return {
        loadTimeMs: nav ? nav.loadEventEnd - nav.startTime : 0,
        domContentLoadedMs: nav ? nav.domContentLoadedEventEnd - nav.startTime : 0,
        firstContentfulPaintMs: fcp ? fcp.startTime : null,
        largestContentfulPaintMs: lcp ? lcp.startTime : null,
        cumulativeLayoutShift: cls
    };
})()"#;

const RESOURCES_PROBE: &str = r#"performance.getEntriesByType('resource').map(e => ({
    url: e.name,
    initiatorType: e.initiatorType || 'other'
}))"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceEntry {
    url: String,
    initiator_type: String,
}

/// Chromium 扫描引擎
///
/// 基于chromiumoxide的无头浏览器扫描；浏览器实例在首次扫描时启动并复用。
pub struct ChromiumScanEngine {
    settings: ScanSettings,
    browser: OnceCell<Browser>,
}

impl ChromiumScanEngine {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            browser: OnceCell::new(),
        }
    }

    async fn browser(&self) -> Result<&Browser, EngineError> {
        self.browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = if let Some(url) = &self.settings.chromium_remote_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url.as_str()).await.map_err(|e| {
                        EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(self.settings.timeout_secs))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .build()
                        .map_err(EngineError::Launch)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| EngineError::Launch(e.to_string()))?
                };

                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }

    async fn open_page(&self) -> Result<Page, EngineError> {
        self.browser()
            .await?
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn collect(&self, page: &Page, url: &str) -> Result<ScanResult, EngineError> {
        page.set_user_agent(USER_AGENT)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        debug!("Navigating to {}", url);
        page.goto(url)
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))?;

        // Late tags are commonly injected after the load event
        tokio::time::sleep(Duration::from_millis(self.settings.settle_ms)).await;

        let mut scan = ScanResult::empty(url);

        match page.content().await {
            Ok(html) => scan.injected_tags = detect_tags(&html),
            Err(e) => scan.push_error(format!("Failed to read page content: {}", e)),
        }

        match evaluate::<Vec<DetectedScript>>(page, SCRIPTS_PROBE).await {
            Ok(scripts) => scan.detected_scripts = scripts,
            Err(e) => scan.push_error(format!("Failed to collect scripts: {}", e)),
        }

        match evaluate::<PerformanceMetrics>(page, PERFORMANCE_PROBE).await {
            Ok(metrics) => scan.performance_metrics = metrics,
            Err(e) => warn!("Performance metrics unavailable for {}: {}", url, e),
        }

        match evaluate::<Vec<ResourceEntry>>(page, RESOURCES_PROBE).await {
            Ok(entries) => {
                scan.network_requests = entries
                    .into_iter()
                    .filter_map(|entry| relevant_request(entry, url))
                    .take(self.settings.max_network_requests)
                    .collect();
            }
            Err(e) => scan.push_error(format!("Failed to collect network requests: {}", e)),
        }

        scan.timestamp = Utc::now();
        Ok(scan)
    }
}

async fn evaluate<T: serde::de::DeserializeOwned>(page: &Page, script: &str) -> Result<T, String> {
    page.evaluate(script)
        .await
        .map_err(|e| e.to_string())?
        .into_value::<T>()
        .map_err(|e| e.to_string())
}

/// 只保留脚本、XHR/fetch以及统计域名的请求
fn relevant_request(entry: ResourceEntry, page_url: &str) -> Option<NetworkRequest> {
    let resource_type = match entry.initiator_type.as_str() {
        "xmlhttprequest" => "xhr".to_string(),
        other => other.to_string(),
    };
    let tracked = TRACKING_REQUEST_DOMAINS
        .iter()
        .any(|domain| entry.url.contains(domain));

    if tracked || matches!(resource_type.as_str(), "script" | "xhr" | "fetch") {
        Some(NetworkRequest {
            url: entry.url,
            resource_type,
            initiator: page_url.to_string(),
        })
    } else {
        None
    }
}

/// 在时限内完成 `work`，超时返回 [`EngineError::Timeout`]
async fn bounded<T, F>(limit: Duration, work: F) -> Result<T, EngineError>
where
    F: std::future::Future<Output = Result<T, EngineError>>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| EngineError::Timeout)?
}

#[async_trait]
impl ScanEngine for ChromiumScanEngine {
    async fn scan(&self, url: &str) -> Result<ScanResult, EngineError> {
        let start = Instant::now();
        let limit = Duration::from_secs(self.settings.timeout_secs);

        let page = bounded(limit, self.open_page()).await?;
        let result = bounded(limit.saturating_sub(start.elapsed()), self.collect(&page, url)).await;

        // The page is released on every path, including a timed out collection
        if let Err(e) = page.close().await {
            warn!("Error closing page: {}", e);
        }

        if let Ok(scan) = &result {
            info!(
                "Scan completed for {} in {}ms - Found {} tags, {} scripts",
                url,
                start.elapsed().as_millis(),
                scan.injected_tags.len(),
                scan.detected_scripts.len()
            );
        }
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
