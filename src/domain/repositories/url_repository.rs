// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::url::Url;
use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 没有匹配的记录
    #[error("Record not found")]
    NotFound,
}

/// 链接仓库特质
///
/// 定义链接数据访问接口
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// 批量插入链接，由存储层分配标识，新链接均为未抓取状态
    async fn insert_many(&self, addresses: Vec<String>) -> Result<Vec<Url>, RepositoryError>;
    /// 列出所有未抓取的链接
    async fn list_unscraped(&self) -> Result<Vec<Url>, RepositoryError>;
    /// 将链接标记为已抓取，标识不存在时返回 `NotFound`
    async fn mark_scraped(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 返回给定地址中已存在于仓库的那部分
    async fn existing_addresses(
        &self,
        addresses: &[String],
    ) -> Result<HashSet<String>, RepositoryError>;
    /// 检查地址是否已存在
    async fn exists_by_address(&self, address: &str) -> Result<bool, RepositoryError> {
        let found = self.existing_addresses(&[address.to_string()]).await?;
        Ok(!found.is_empty())
    }
}
