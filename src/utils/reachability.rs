// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::lookup_host;
use tracing::warn;
use url::Url;

/// 预检结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// 主机可解析
    Reachable { host: String },
    /// URL非法或主机不可解析
    Unreachable { reason: String },
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable { .. })
    }
}

/// 可达性预检特质
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn check(&self, url: &str) -> Reachability;
}

/// 基于DNS解析的预检
///
/// 在启动昂贵的浏览器扫描前确认主机存在。解析本身没有取消机制，
/// 超时后放行（浏览器扫描有自己的超时）。
#[derive(Debug, Clone)]
pub struct DnsPrechecker {
    timeout: Duration,
}

impl Default for DnsPrechecker {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

impl DnsPrechecker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ReachabilityCheck for DnsPrechecker {
    async fn check(&self, url: &str) -> Reachability {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => {
                return Reachability::Unreachable {
                    reason: "Invalid URL format".to_string(),
                }
            }
        };
        let Some(host) = parsed.host_str().map(str::to_string) else {
            return Reachability::Unreachable {
                reason: "Invalid URL format".to_string(),
            };
        };

        // lookup_host 需要 host:port
        let port = parsed.port_or_known_default().unwrap_or(80);
        let target = format!("{}:{}", host, port);

        match tokio::time::timeout(self.timeout, lookup_host(target)).await {
            Ok(Ok(mut addrs)) => {
                if addrs.next().is_some() {
                    Reachability::Reachable { host }
                } else {
                    Reachability::Unreachable {
                        reason: format!("DNS resolution failed (no addresses for {})", host),
                    }
                }
            }
            Ok(Err(e)) => Reachability::Unreachable {
                reason: format!("DNS resolution failed ({})", e),
            },
            Err(_) => {
                warn!(
                    "DNS lookup for {} exceeded {}ms, continuing without precheck",
                    host,
                    self.timeout.as_millis()
                );
                Reachability::Reachable { host }
            }
        }
    }
}
