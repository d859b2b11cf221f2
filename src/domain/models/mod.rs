// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 审计记录（audit_job）：对外可见的审计状态与结果
/// - 队列任务（job）：进程内的调度单元
/// - 扫描结果（scan_result）：浏览器采集的数据
/// - 分析结果（analysis_result）：远程分析服务的返回
/// - 报告（report）：最终组装的审计报告
pub mod analysis_result;
pub mod audit_job;
pub mod job;
pub mod report;
pub mod scan_result;
