// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 链接发现（link_harvester）：翻阅列表页并收集商品链接
/// - 商品提取（product_extractor）：从详情页读取商品字段
pub mod link_harvester;
pub mod product_extractor;
