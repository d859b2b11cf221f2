// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 处理器模块
///
/// 处理审计任务与队列监控的HTTP请求
pub mod audit_handler;
