// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 待抓取的商品详情页链接
///
/// 由链接采集器批量创建，`scraped` 只会被工作者从 `false` 翻转为 `true` 一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    /// 存储层分配的唯一标识符
    pub id: Uuid,
    /// 详情页地址
    pub address: String,
    /// 是否已完成抓取
    pub scraped: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}
