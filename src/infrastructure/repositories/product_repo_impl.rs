// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{NewProduct, Product};
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::url_repository::RepositoryError;
use crate::infrastructure::database::entities::product as product_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 商品仓库实现
pub struct ProductRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ProductRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<product_entity::Model> for Product {
    fn from(model: product_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            store_name: model.store_name,
            price: model.price,
            rating: model.rating,
            image_link: model.image_link,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let active_model = product_entity::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(product.name),
            description: Set(product.description),
            store_name: Set(product.store_name),
            price: Set(product.price),
            rating: Set(product.rating),
            image_link: Set(product.image_link),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        Ok(model.into())
    }
}
