// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 分析服务（analysis_service）：远程分析服务的接口与错误类型
/// - 健康分（health_scorer）：根据发现、性能和标签计算健康分
/// - 报告组装（report_assembler）：把扫描与分析结果合并为报告
pub mod analysis_service;
pub mod health_scorer;
pub mod report_assembler;
