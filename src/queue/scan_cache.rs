// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan_result::ScanResult;
use dashmap::DashMap;
use uuid::Uuid;

/// 扫描结果缓存
///
/// 以存储记录ID为键，在限流重试之间保留扫描结果，避免重复扫描。
#[derive(Debug, Default)]
pub struct ScanCache {
    entries: DashMap<Uuid, ScanResult>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store_job_id: &Uuid) -> Option<ScanResult> {
        self.entries.get(store_job_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, store_job_id: Uuid, scan: ScanResult) {
        self.entries.insert(store_job_id, scan);
    }

    pub fn contains(&self, store_job_id: &Uuid) -> bool {
        self.entries.contains_key(store_job_id)
    }

    pub fn remove(&self, store_job_id: &Uuid) -> Option<ScanResult> {
        self.entries.remove(store_job_id).map(|(_, scan)| scan)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
