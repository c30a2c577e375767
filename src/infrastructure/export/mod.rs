// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 导出模块
///
/// CSV 文件导出和单写者任务
pub mod csv_export;
pub mod writer;
