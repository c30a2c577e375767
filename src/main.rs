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

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use prodcrawl::config::settings::Settings;
use prodcrawl::domain::repositories::url_repository::UrlRepository;
use prodcrawl::domain::services::link_harvester::LinkHarvester;
use prodcrawl::domain::services::product_extractor::ProductExtractor;
use prodcrawl::engines::chromium_engine::ChromiumDriver;
use prodcrawl::engines::traits::BrowserDriver;
use prodcrawl::infrastructure::database::connection;
use prodcrawl::infrastructure::export::csv_export::CsvExporter;
use prodcrawl::infrastructure::export::writer::ExportWriter;
use prodcrawl::infrastructure::metrics;
use prodcrawl::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use prodcrawl::infrastructure::repositories::url_repo_impl::UrlRepositoryImpl;
use prodcrawl::utils::telemetry;
use prodcrawl::workers::ScrapeWorkerPool;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "prodcrawl",
    version,
    about = "Discover product links from catalog listings and scrape product details"
)]
struct Cli {
    /// 提高日志详细级别（-v 为 debug，-vv 为 trace）
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 翻阅列表页并保存新的商品链接
    Discover {
        #[arg(long, value_name = "N")]
        target: Option<usize>,
    },
    /// 抓取所有未抓取的链接
    Scrape {
        #[arg(long, value_name = "W")]
        workers: Option<usize>,
    },
    /// 先发现链接再抓取
    Run {
        #[arg(long, value_name = "N")]
        target: Option<usize>,
        #[arg(long, value_name = "W")]
        workers: Option<usize>,
    },
}

/// 主函数
///
/// 初始化日志、配置、数据库和浏览器后执行子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.verbose);
    info!("Starting prodcrawl...");

    let mut settings = Settings::new().context("failed to load configuration")?;
    let (target, workers) = match cli.command {
        Command::Discover { target } => (target, None),
        Command::Scrape { workers } => (None, workers),
        Command::Run { target, workers } => (target, workers),
    };
    if let Some(workers) = workers {
        settings.scraper.workers = workers;
    }
    settings.validate().context("invalid configuration")?;
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics).context("invalid metrics listen address")?;

    let db = connection::connect_and_migrate(&settings.database)
        .await
        .context("failed to prepare database")?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let driver: Arc<dyn BrowserDriver> = Arc::new(ChromiumDriver::new(
        settings.browser.clone(),
        Duration::from_secs(settings.scraper.page_timeout_secs),
        Duration::from_millis(settings.scraper.scroll_settle_ms),
    ));
    let url_repo: Arc<dyn UrlRepository> = Arc::new(UrlRepositoryImpl::new(db.clone()));

    match cli.command {
        Command::Discover { .. } => {
            discover(&settings, driver, url_repo, target, &cancel).await?;
        }
        Command::Scrape { .. } => {
            scrape(&settings, driver, url_repo, db, &cancel).await?;
        }
        Command::Run { .. } => {
            discover(&settings, driver.clone(), url_repo.clone(), target, &cancel).await?;
            scrape(&settings, driver, url_repo, db, &cancel).await?;
        }
    }

    info!("Done");
    Ok(())
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown signal received, finishing in-flight work");
                cancel.cancel();
            }
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    });
}

async fn discover(
    settings: &Settings,
    driver: Arc<dyn BrowserDriver>,
    url_repo: Arc<dyn UrlRepository>,
    target: Option<usize>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let target = target.unwrap_or(settings.harvest.target_count);
    let harvester = LinkHarvester::new(
        driver,
        url_repo,
        settings.harvest.listing_template.clone(),
        settings.selectors.product_link.clone(),
        settings.harvest.max_pages,
    );

    let urls = harvester
        .discover_links(target, cancel)
        .await
        .context("link discovery failed")?;
    info!("Saved {} product link(s)", urls.len());
    Ok(())
}

async fn scrape(
    settings: &Settings,
    driver: Arc<dyn BrowserDriver>,
    url_repo: Arc<dyn UrlRepository>,
    db: Arc<DatabaseConnection>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let pool = ScrapeWorkerPool::new(
        driver,
        Arc::new(ProductExtractor::new(settings.selectors.clone())),
        url_repo,
        Arc::new(ProductRepositoryImpl::new(db)),
        Arc::new(ExportWriter::spawn(CsvExporter::new(&settings.export.path))),
        &settings.scraper,
    );

    let summary = pool
        .scrape_all_pending(cancel)
        .await
        .context("scrape finished with failures")?;
    info!("Scrape summary: {}", summary);
    Ok(())
}
