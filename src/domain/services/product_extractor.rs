// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SelectorSettings;
use crate::domain::models::product::NewProduct;
use crate::engines::traits::{BrowserSession, SessionError};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// 商品字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Title,
    Description,
    StoreName,
    Price,
    Rating,
    ImageLink,
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductField::Title => "title",
            ProductField::Description => "description",
            ProductField::StoreName => "store name",
            ProductField::Price => "price",
            ProductField::Rating => "rating",
            ProductField::ImageLink => "image link",
        };
        f.write_str(name)
    }
}

/// 提取错误类型
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// 必填字段读取失败
    #[error("failed to get product {field}: {source}")]
    Field {
        field: ProductField,
        #[source]
        source: SessionError,
    },
    /// 评分存在但无法解析
    #[error("invalid rating {raw:?}: {source}")]
    InvalidRating {
        raw: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

impl ExtractionError {
    /// 失败的字段
    pub fn field(&self) -> ProductField {
        match self {
            ExtractionError::Field { field, .. } => *field,
            ExtractionError::InvalidRating { .. } => ProductField::Rating,
        }
    }
}

/// 去除价格中的所有非数字字符
///
/// `"Rp1.250.000"` 变为 `"1250000"`。没有数字时返回空字符串。
pub fn normalize_price(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// 解析评分
///
/// 空值回退为 0，非空且无法解析的值返回错误。
pub fn parse_rating(raw: &str) -> Result<f32, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f32>()
        .map_err(|source| ExtractionError::InvalidRating {
            raw: trimmed.to_string(),
            source,
        })
}

/// 商品提取器
///
/// 在已加载的详情页上依次读取六个字段。评分缺失时回退为 0，
/// 其余字段缺失即失败，且第一个失败的字段会中止后续读取。
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    selectors: SelectorSettings,
}

impl ProductExtractor {
    pub fn new(selectors: SelectorSettings) -> Self {
        Self { selectors }
    }

    /// 从当前页面提取商品
    ///
    /// # 参数
    ///
    /// * `session` - 已导航到详情页的会话
    ///
    /// # 返回值
    ///
    /// * `Ok(NewProduct)` - 提取结果
    /// * `Err(ExtractionError)` - 第一个失败的字段
    pub async fn extract(&self, session: &dyn BrowserSession) -> Result<NewProduct, ExtractionError> {
        let name = self
            .required_text(session, ProductField::Title, &self.selectors.title)
            .await?;
        let description = self
            .required_text(session, ProductField::Description, &self.selectors.description)
            .await?;
        let store_name = self
            .required_text(session, ProductField::StoreName, &self.selectors.store_name)
            .await?;
        let raw_price = self
            .required_text(session, ProductField::Price, &self.selectors.price)
            .await?;

        let raw_rating = match session.locator_text(&self.selectors.rating).await {
            Ok(text) => text,
            Err(e) => {
                debug!("Rating unavailable, defaulting to 0: {}", e);
                String::new()
            }
        };
        let rating = parse_rating(&raw_rating)?;

        let image_link = session
            .locator_attribute(&self.selectors.image, "src")
            .await
            .map_err(|source| ExtractionError::Field {
                field: ProductField::ImageLink,
                source,
            })?;

        Ok(NewProduct {
            name,
            description,
            store_name,
            price: normalize_price(&raw_price),
            rating,
            image_link: image_link.trim().to_string(),
        })
    }

    async fn required_text(
        &self,
        session: &dyn BrowserSession,
        field: ProductField,
        selector: &str,
    ) -> Result<String, ExtractionError> {
        session
            .locator_text(selector)
            .await
            .map(|text| text.trim().to_string())
            .map_err(|source| ExtractionError::Field { field, source })
    }
}

#[cfg(test)]
#[path = "product_extractor_test.rs"]
mod tests;
