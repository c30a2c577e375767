// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::url::Url;
use crate::domain::repositories::url_repository::{RepositoryError, UrlRepository};
use crate::infrastructure::database::entities::url as url_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// 单条语句的最大行数，每行 5 个绑定参数，需低于 SQLite 旧版本的 999 个参数上限
const ROWS_PER_STATEMENT: usize = 150;

/// 链接仓库实现
///
/// 基于SeaORM实现的链接数据访问层
#[derive(Clone)]
pub struct UrlRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl UrlRepositoryImpl {
    /// 创建新的链接仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的链接仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<url_entity::Model> for Url {
    fn from(model: url_entity::Model) -> Self {
        Self {
            id: model.id,
            address: model.address,
            scraped: model.scraped,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Url> for url_entity::ActiveModel {
    fn from(url: Url) -> Self {
        Self {
            id: Set(url.id),
            address: Set(url.address),
            scraped: Set(url.scraped),
            created_at: Set(url.created_at),
            updated_at: Set(url.updated_at),
        }
    }
}

#[async_trait]
impl UrlRepository for UrlRepositoryImpl {
    async fn insert_many(&self, addresses: Vec<String>) -> Result<Vec<Url>, RepositoryError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now().fixed_offset();
        let urls: Vec<Url> = addresses
            .into_iter()
            .map(|address| Url {
                id: Uuid::new_v4(),
                address,
                scraped: false,
                created_at: now,
                updated_at: now,
            })
            .collect();

        // All chunks commit together; dropping the transaction on error rolls back
        let txn = self.db.begin().await?;
        for chunk in urls.chunks(ROWS_PER_STATEMENT) {
            let models = chunk.iter().cloned().map(url_entity::ActiveModel::from);
            url_entity::Entity::insert_many(models)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(urls)
    }

    async fn list_unscraped(&self) -> Result<Vec<Url>, RepositoryError> {
        let models = url_entity::Entity::find()
            .filter(url_entity::Column::Scraped.eq(false))
            .order_by_asc(url_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_scraped(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = url_entity::Entity::update_many()
            .col_expr(url_entity::Column::Scraped, Expr::value(true))
            .col_expr(
                url_entity::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(url_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn existing_addresses(
        &self,
        addresses: &[String],
    ) -> Result<HashSet<String>, RepositoryError> {
        let mut found = HashSet::new();
        for chunk in addresses.chunks(ROWS_PER_STATEMENT) {
            let rows: Vec<String> = url_entity::Entity::find()
                .select_only()
                .column(url_entity::Column::Address)
                .filter(url_entity::Column::Address.is_in(chunk.iter().cloned()))
                .into_tuple()
                .all(self.db.as_ref())
                .await?;
            found.extend(rows);
        }
        Ok(found)
    }
}
