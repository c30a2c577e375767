// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{NewProduct, Product};
use crate::domain::repositories::url_repository::RepositoryError;
use async_trait::async_trait;

/// 商品仓库特质
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 保存商品并返回带有新标识的实体
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError>;
}
