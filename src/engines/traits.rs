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

use crate::domain::models::scan_result::ScanResult;
use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser unavailable: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 超时
    #[error("Scan timed out")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 扫描引擎特质
///
/// 实现可以直接返回错误，也可以返回 `errors` 非空的部分结果；
/// 两种情况流水线都按失败处理。
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// 扫描目标页面
    async fn scan(&self, url: &str) -> Result<ScanResult, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
