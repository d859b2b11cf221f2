// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供错误分类、可达性预检和遥测初始化
pub mod errors;
pub mod reachability;
pub mod telemetry;
