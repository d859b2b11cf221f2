use crate::helpers::{broken_scan, fast_policy, FakeReachability, FakeScanEngine, Harness};
use auditrs::domain::models::audit_job::AuditStatus;
use auditrs::domain::services::analysis_service::AnalysisError;
use auditrs::queue::backoff::RetryPolicy;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_retry_after_hint_defers_and_reuses_cached_scan() {
    let harness = Harness::new(RetryPolicy::default());
    harness.analysis.push(Err(AnalysisError::RateLimited {
        retry_after_seconds: Some(10),
    }));

    let id = harness.submit("https://example.com").await;

    let deferred = harness
        .wait_for(id, Duration::from_secs(5), |r| {
            r.status == AuditStatus::Analyzing && r.error_message.is_some()
        })
        .await;
    assert_eq!(
        deferred.error_message.as_deref(),
        Some("Rate limited by analysis service. Will retry in ~10s...")
    );
    assert!(harness.scheduler.scan_cache().contains(&id));
    assert_eq!(harness.scheduler.status().scheduled_retries, 1);

    let done = harness
        .wait_for_status(id, AuditStatus::Completed, Duration::from_secs(30))
        .await;

    assert_eq!(harness.engine.calls(), 1);
    let times = harness.analysis.call_times.lock().clone();
    assert_eq!(times.len(), 2);
    let gap = times[1] - times[0];
    assert!(
        gap >= Duration::from_secs(10) && gap < Duration::from_secs(11),
        "retry fired after {:?}",
        gap
    );

    let report = done.results.expect("completed record carries a report");
    assert_eq!(report["summary"]["url"], "https://example.com");
    assert_eq!(report["healthScore"], 82);
    assert!(done.analysis_data.is_some());
    assert!(done.error_message.is_none());
    assert!(!harness.scheduler.scan_cache().contains(&id));

    assert_eq!(
        harness.repository.history_for(id),
        vec![
            AuditStatus::Scanning,
            AuditStatus::Analyzing,
            AuditStatus::Analyzing,
            AuditStatus::Analyzing,
            AuditStatus::Completed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_host_fails_without_retry() {
    let reachability = FakeReachability {
        unreachable_hosts: ["no-such-host.invalid".to_string()].into_iter().collect(),
    };
    let harness = Harness::build(
        RetryPolicy::default(),
        FakeScanEngine::default(),
        reachability,
    );

    let id = harness.submit("https://no-such-host.invalid/").await;
    let failed = harness
        .wait_for_status(id, AuditStatus::Failed, Duration::from_secs(1))
        .await;
    assert!(failed
        .error_message
        .unwrap()
        .starts_with("DNS resolution failed"));

    harness.wait_idle(Duration::from_secs(1)).await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(harness.engine.calls(), 0);
    assert_eq!(harness.analysis.calls(), 0);
    assert_eq!(harness.repository.history_for(id), vec![AuditStatus::Failed]);
    assert_eq!(harness.scheduler.status().scheduled_retries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_exhaust_retries() {
    let harness = Harness::new(fast_policy());
    for _ in 0..3 {
        harness
            .engine
            .push(Ok(broken_scan("https://example.com", "net::ERR_CONNECTION_RESET")));
    }

    let start = Instant::now();
    let id = harness.submit("https://example.com").await;

    // between attempts the record stays in its in-progress state
    let waiting = harness
        .wait_for(id, Duration::from_secs(1), |_| {
            harness.scheduler.status().scheduled_retries == 1
        })
        .await;
    assert_eq!(waiting.status, AuditStatus::Scanning);
    assert!(waiting.error_message.is_none());

    let failed = harness
        .wait_for_status(id, AuditStatus::Failed, Duration::from_secs(60))
        .await;

    assert_eq!(
        failed.error_message.as_deref(),
        Some("Job processing failed after 3 retries: Scan failed: net::ERR_CONNECTION_RESET")
    );
    // 5s after the first failure, 10s after the second
    assert!(start.elapsed() >= Duration::from_secs(15));
    assert_eq!(harness.engine.calls(), 3);
    assert_eq!(harness.analysis.calls(), 0);
    assert!(harness.scheduler.scan_cache().is_empty());
    assert_eq!(
        harness.repository.history_for(id),
        vec![
            AuditStatus::Scanning,
            AuditStatus::Scanning,
            AuditStatus::Scanning,
            AuditStatus::Failed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_only_one_pipeline_runs_at_a_time() {
    let harness = Harness::build(
        RetryPolicy::default(),
        FakeScanEngine::with_delay(Duration::from_millis(200)),
        FakeReachability::default(),
    );

    let first = harness.submit("https://one.example.com").await;
    let second = harness.submit("https://two.example.com").await;
    let third = harness.submit("https://three.example.com").await;
    assert!(harness.scheduler.status().is_processing);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = harness.scheduler.status();
    assert!(status.is_processing);
    assert_eq!(status.queue_length, 2);
    assert_eq!(status.jobs.len(), 2);
    assert!(status.jobs.iter().all(|j| j.retry_count == 0));
    let json = serde_json::to_string(&status).unwrap();
    assert!(!json.contains("example.com"), "status leaks payload: {}", json);

    harness.wait_idle(Duration::from_secs(5)).await;

    assert_eq!(harness.engine.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(harness.engine.calls(), 3);
    assert_eq!(
        harness.repository.ids_reaching(AuditStatus::Completed),
        vec![first, second, third]
    );
}

#[tokio::test(start_paused = true)]
async fn test_default_cooldown_gates_retry_without_rescanning() {
    let harness = Harness::new(RetryPolicy::default());
    harness.analysis.push(Err(AnalysisError::RateLimited {
        retry_after_seconds: None,
    }));

    let id = harness.submit("https://example.com").await;

    let first = harness
        .wait_for(id, Duration::from_secs(5), |r| {
            r.error_message
                .as_deref()
                .is_some_and(|m| m.contains("Will retry shortly"))
        })
        .await;
    assert_eq!(first.status, AuditStatus::Analyzing);
    assert!(harness.scheduler.rate_limit_window().is_active());

    // capped linear backoff fires at 15s, the 60s cooldown is still running
    let gated = harness
        .wait_for(id, Duration::from_secs(20), |r| {
            r.error_message.as_deref().is_some_and(|m| m.contains("~45s"))
        })
        .await;
    assert_eq!(gated.status, AuditStatus::Analyzing);
    assert_eq!(harness.analysis.calls(), 1);
    assert!(harness.scheduler.scan_cache().contains(&id));

    harness
        .wait_for_status(id, AuditStatus::Completed, Duration::from_secs(60))
        .await;

    assert_eq!(harness.engine.calls(), 1);
    let times = harness.analysis.call_times.lock().clone();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] >= Duration::from_secs(60));
    assert!(harness.scheduler.scan_cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_defers_other_jobs_before_scanning() {
    let harness = Harness::new(RetryPolicy::default());
    harness.analysis.push(Err(AnalysisError::RateLimited {
        retry_after_seconds: Some(30),
    }));

    let first = harness.submit("https://one.example.com").await;
    let second = harness.submit("https://two.example.com").await;

    let deferred = harness
        .wait_for(second, Duration::from_secs(5), |r| r.error_message.is_some())
        .await;
    assert_eq!(deferred.status, AuditStatus::Analyzing);
    assert_eq!(
        deferred.error_message.as_deref(),
        Some("Rate limited by analysis service. Will retry in ~30s...")
    );
    assert_eq!(harness.engine.calls(), 1);
    assert!(!harness.scheduler.scan_cache().contains(&second));

    harness
        .wait_for_status(first, AuditStatus::Completed, Duration::from_secs(60))
        .await;
    harness
        .wait_for_status(second, AuditStatus::Completed, Duration::from_secs(60))
        .await;
    assert_eq!(harness.engine.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_analysis_failure_keeps_cached_scan() {
    let harness = Harness::new(RetryPolicy::default());
    harness.analysis.push(Err(AnalysisError::ClientError {
        status: 500,
        body: "internal error".to_string(),
    }));

    let id = harness.submit("https://example.com").await;
    harness
        .wait_for_status(id, AuditStatus::Completed, Duration::from_secs(30))
        .await;

    assert_eq!(harness.engine.calls(), 1);
    assert_eq!(harness.analysis.calls(), 2);
    let times = harness.analysis.call_times.lock().clone();
    assert!(times[1] - times[0] >= Duration::from_secs(5));
    assert!(harness.scheduler.scan_cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_job_still_respects_retry_cap() {
    let policy = RetryPolicy {
        max_retries: 2,
        ..RetryPolicy::default()
    };
    let harness = Harness::new(policy);
    for _ in 0..2 {
        harness.analysis.push(Err(AnalysisError::RateLimited {
            retry_after_seconds: Some(5),
        }));
    }

    let id = harness.submit("https://example.com").await;
    let failed = harness
        .wait_for_status(id, AuditStatus::Failed, Duration::from_secs(30))
        .await;

    assert_eq!(
        failed.error_message.as_deref(),
        Some("Job processing failed after 2 retries: Rate limited: Analysis HTTP 429")
    );
    assert_eq!(harness.engine.calls(), 1);
    assert!(harness.scheduler.scan_cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_oversized_retry_after_does_not_stall_queue() {
    let harness = Harness::new(RetryPolicy::default());
    harness.analysis.push(Err(AnalysisError::RateLimited {
        retry_after_seconds: Some(u64::MAX),
    }));

    let first = harness.submit("https://one.example.com").await;
    let second = harness.submit("https://two.example.com").await;

    let deferred = harness
        .wait_for(first, Duration::from_secs(5), |r| r.error_message.is_some())
        .await;
    assert_eq!(
        deferred.error_message.as_deref(),
        Some("Rate limited by analysis service. Will retry in ~3600s...")
    );
    assert_eq!(harness.scheduler.rate_limit_window().remaining_hint(), Some(Duration::from_secs(3600)));

    tokio::time::sleep(Duration::from_secs(3590)).await;
    harness
        .wait_for_status(first, AuditStatus::Completed, Duration::from_secs(60))
        .await;
    harness
        .wait_for_status(second, AuditStatus::Completed, Duration::from_secs(60))
        .await;
    harness.wait_idle(Duration::from_secs(5)).await;

    let status = harness.scheduler.status();
    assert!(!status.is_processing);
    assert_eq!(status.queue_length, 0);
    assert_eq!(harness.engine.calls(), 2);
}
