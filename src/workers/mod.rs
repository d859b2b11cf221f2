// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供审计流水线的执行逻辑
pub mod audit_pipeline;

pub use audit_pipeline::AuditPipeline;
