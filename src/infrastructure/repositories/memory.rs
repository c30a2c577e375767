// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{NewProduct, Product};
use crate::domain::models::url::Url;
use crate::domain::repositories::export_repository::{ExportError, ExportSink};
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::url_repository::{RepositoryError, UrlRepository};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 内存链接仓库
///
/// 与数据库实现遵循相同约定：地址唯一，标记不存在的标识返回 `NotFound`。
#[derive(Clone, Default)]
pub struct InMemoryUrlRepository {
    urls: Arc<RwLock<Vec<Url>>>,
}

impl InMemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有链接的快照
    pub async fn all(&self) -> Vec<Url> {
        self.urls.read().await.clone()
    }

    /// 已抓取的链接数量
    pub async fn scraped_count(&self) -> usize {
        self.urls.read().await.iter().filter(|u| u.scraped).count()
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn insert_many(&self, addresses: Vec<String>) -> Result<Vec<Url>, RepositoryError> {
        let mut urls = self.urls.write().await;

        let mut seen: HashSet<&str> = urls.iter().map(|u| u.address.as_str()).collect();
        for address in &addresses {
            if !seen.insert(address.as_str()) {
                return Err(RepositoryError::Database(DbErr::Custom(format!(
                    "duplicate address: {}",
                    address
                ))));
            }
        }

        let now = Utc::now().fixed_offset();
        let inserted: Vec<Url> = addresses
            .into_iter()
            .map(|address| Url {
                id: Uuid::new_v4(),
                address,
                scraped: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        urls.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn list_unscraped(&self) -> Result<Vec<Url>, RepositoryError> {
        Ok(self
            .urls
            .read()
            .await
            .iter()
            .filter(|u| !u.scraped)
            .cloned()
            .collect())
    }

    async fn mark_scraped(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut urls = self.urls.write().await;
        let url = urls
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        url.scraped = true;
        url.updated_at = Utc::now().fixed_offset();
        Ok(())
    }

    async fn existing_addresses(
        &self,
        addresses: &[String],
    ) -> Result<HashSet<String>, RepositoryError> {
        let urls = self.urls.read().await;
        Ok(addresses
            .iter()
            .filter(|address| urls.iter().any(|u| &u.address == *address))
            .cloned()
            .collect())
    }
}

/// 内存商品仓库
///
/// 可以配置为对指定名称的商品写入失败。
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
    reject_names: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入该名称的商品时返回数据库错误
    pub async fn reject_name(&self, name: &str) {
        self.reject_names.write().await.insert(name.to_string());
    }

    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        if self.reject_names.read().await.contains(&product.name) {
            return Err(RepositoryError::Database(DbErr::Custom(format!(
                "insert rejected for {}",
                product.name
            ))));
        }

        let product = Product::from_new(Uuid::new_v4(), product, Utc::now().fixed_offset());
        self.products.write().await.push(product.clone());
        Ok(product)
    }
}

/// 内存导出接收端
#[derive(Clone, Default)]
pub struct InMemoryExportSink {
    rows: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn rows(&self) -> Vec<Product> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl ExportSink for InMemoryExportSink {
    async fn append_products(&self, products: &[Product]) -> Result<(), ExportError> {
        self.rows.write().await.extend_from_slice(products);
        Ok(())
    }
}
