// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::Product;
use crate::domain::repositories::export_repository::{ExportError, EXPORT_HEADER};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// CSV 文件导出
///
/// 每次调用以追加模式打开目标文件，文件不存在或为空时先写表头。
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加商品行
    pub fn append(&self, products: &[Product]) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if fresh {
            writer.write_record(EXPORT_HEADER)?;
        }
        for product in products {
            let rating = format!("{:.2}", product.rating);
            writer.write_record([
                product.name.as_str(),
                product.description.as_str(),
                product.store_name.as_str(),
                product.price.as_str(),
                rating.as_str(),
                product.image_link.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
