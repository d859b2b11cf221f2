// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：审计记录、扫描结果、分析结果与报告
/// - 仓库接口（repositories）：审计记录的持久化抽象
/// - 服务（services）：分析服务接口、报告组装与健康分计算
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
