// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const JOBS_ENQUEUED: &str = "audit_jobs_enqueued_total";
pub const JOBS_COMPLETED: &str = "audit_jobs_completed_total";
pub const JOBS_FAILED: &str = "audit_jobs_failed_total";
pub const JOBS_RETRIED: &str = "audit_jobs_retried_total";
pub const SCAN_CACHE_HITS: &str = "audit_scan_cache_hits_total";
pub const QUEUE_LENGTH: &str = "audit_queue_length";

/// 初始化指标导出
///
/// 安装失败（如端口被占用）只记录警告，服务继续运行。
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(JOBS_ENQUEUED, "Total number of audit jobs enqueued");
    describe_counter!(JOBS_COMPLETED, "Total number of audit jobs completed");
    describe_counter!(JOBS_FAILED, "Total number of audit jobs permanently failed");
    describe_counter!(JOBS_RETRIED, "Total number of audit job retries scheduled, by reason");
    describe_counter!(SCAN_CACHE_HITS, "Total number of scans reused from the cache");
    describe_gauge!(QUEUE_LENGTH, "Number of audit jobs waiting in the queue");

    info!("Metrics exporter listening on {}", addr);
}
