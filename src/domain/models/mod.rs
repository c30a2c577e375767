// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 链接（url）：链接采集器发现的商品详情页地址及其抓取状态
/// - 商品（product）：从详情页提取并持久化的结构化商品记录
pub mod product;
pub mod url;

pub use product::{NewProduct, Product};
pub use url::Url;
