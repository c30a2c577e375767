// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 链接仓库（url_repository）：管理待抓取链接及其抓取状态
/// - 商品仓库（product_repository）：管理商品记录的持久化
/// - 导出接收端（export_repository）：只追加的表格导出
pub mod export_repository;
pub mod product_repository;
pub mod url_repository;
