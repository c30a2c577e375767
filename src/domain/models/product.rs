// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 提取得到、尚未入库的商品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub store_name: String,
    /// 仅包含数字的价格字符串
    pub price: String,
    pub rating: f32,
    pub image_link: String,
}

/// 已持久化的商品实体
///
/// 每个成功处理的 `Url` 对应一条，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 存储层分配的唯一标识符
    pub id: Uuid,
    /// 商品名称
    pub name: String,
    /// 商品描述
    pub description: String,
    /// 店铺名称
    pub store_name: String,
    /// 规范化后的价格，保留原始数字序列，不含货币符号和分隔符
    pub price: String,
    /// 评分，缺失时为 0
    pub rating: f32,
    /// 主图地址
    pub image_link: String,
    pub created_at: DateTime<FixedOffset>,
}

impl Product {
    /// 由提取结果和存储层分配的标识构建实体
    pub fn from_new(id: Uuid, new: NewProduct, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            store_name: new.store_name,
            price: new.price,
            rating: new.rating,
            image_link: new.image_link,
            created_at,
        }
    }
}
