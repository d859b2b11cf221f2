// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供审计任务的排队、单流水线调度和重试管理
pub mod backoff;
pub mod rate_limit_window;
pub mod scan_cache;
pub mod scheduler;
