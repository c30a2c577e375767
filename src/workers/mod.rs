// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 抓取工作池和单个链接的处理单元
pub mod manager;
pub mod scrape_worker;

pub use manager::{ScrapeSummary, ScrapeWorkerPool};
