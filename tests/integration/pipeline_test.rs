// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use prodcrawl::config::settings::SelectorSettings;
use prodcrawl::domain::repositories::url_repository::UrlRepository;
use prodcrawl::domain::services::link_harvester::LinkHarvester;
use prodcrawl::domain::services::product_extractor::ProductExtractor;
use prodcrawl::engines::scripted_engine::ScriptedDriver;
use prodcrawl::infrastructure::export::csv_export::CsvExporter;
use prodcrawl::infrastructure::export::writer::ExportWriter;
use prodcrawl::infrastructure::repositories::memory::{
    InMemoryProductRepository, InMemoryUrlRepository,
};
use prodcrawl::utils::errors::ScrapeError;
use prodcrawl::workers::ScrapeWorkerPool;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn harvester(driver: &ScriptedDriver, urls: &InMemoryUrlRepository) -> LinkHarvester {
    LinkHarvester::new(
        Arc::new(driver.clone()),
        Arc::new(urls.clone()),
        LISTING_TEMPLATE,
        SelectorSettings::default().product_link,
        50,
    )
}

fn pool(
    driver: &ScriptedDriver,
    urls: &InMemoryUrlRepository,
    products: &InMemoryProductRepository,
    export_path: &Path,
    workers: usize,
) -> ScrapeWorkerPool {
    ScrapeWorkerPool::new(
        Arc::new(driver.clone()),
        Arc::new(ProductExtractor::new(SelectorSettings::default())),
        Arc::new(urls.clone()),
        Arc::new(products.clone()),
        Arc::new(ExportWriter::spawn(CsvExporter::new(export_path))),
        &scraper_settings(workers),
    )
}

fn csv_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_discover_then_scrape_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("data.csv");
    let driver = catalog(5, 10);
    let urls = InMemoryUrlRepository::new();
    let products = InMemoryProductRepository::new();
    let cancel = CancellationToken::new();

    let discovered = harvester(&driver, &urls)
        .discover_links(25, &cancel)
        .await
        .unwrap();
    assert_eq!(discovered.len(), 25);
    assert_eq!(driver.visited().len(), 3);

    let summary = pool(&driver, &urls, &products, &export_path, 4)
        .scrape_all_pending(&cancel)
        .await
        .unwrap();

    assert_eq!(summary.total, 25);
    assert_eq!(summary.succeeded, 25);
    assert_eq!(products.all().await.len(), 25);
    assert!(urls.list_unscraped().await.unwrap().is_empty());

    let lines = csv_lines(&export_path);
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0], "Name,Description,StoreName,Price,Rating,ImageLink");
    assert!(lines[1..].iter().all(|l| l.contains(",1250000,4.80,")));

    // Every tab opened for discovery and scraping was closed
    assert_eq!(driver.opened_sessions(), 26);
    assert_eq!(driver.closed_sessions(), 26);
}

#[tokio::test]
async fn test_repeated_discovery_skips_known_links() {
    let driver = catalog(5, 10);
    let urls = InMemoryUrlRepository::new();
    let cancel = CancellationToken::new();

    harvester(&driver, &urls)
        .discover_links(25, &cancel)
        .await
        .unwrap();
    let second = harvester(&driver, &urls)
        .discover_links(5, &cancel)
        .await
        .unwrap();

    assert_eq!(second.len(), 5);
    assert_eq!(second[0].address, product_url(3, 5));
    assert_eq!(urls.all().await.len(), 30);
}

#[tokio::test]
async fn test_failed_url_is_retried_on_next_run_only() {
    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("data.csv");
    let urls = InMemoryUrlRepository::new();
    let products = InMemoryProductRepository::new();
    let addresses: Vec<String> = (1..=4).map(|i| product_url(1, i)).collect();
    urls.insert_many(addresses.clone()).await.unwrap();

    let driver = ScriptedDriver::new()
        .with_page(&addresses[0], product_page("Phone 1", "Rp100", Some("4.0")))
        .with_page(&addresses[1], product_page("Phone 2", "Rp200", Some("4.1")))
        .with_page(&addresses[2], product_page_without_image("Phone 3"))
        .with_page(&addresses[3], product_page("Phone 4", "Rp400", None));

    let err = pool(&driver, &urls, &products, &export_path, 4)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        ScrapeError::Failed {
            failed,
            total,
            first,
        } => {
            assert_eq!((failed, total), (1, 4));
            assert_eq!(first.address(), addresses[2]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(products.all().await.len(), 3);
    assert_eq!(csv_lines(&export_path).len(), 4);

    // The page is fixed; only the failed URL is processed again
    let driver = driver.with_page(&addresses[2], product_page("Phone 3", "Rp300", Some("3.9")));
    let visited_before = driver.visited().len();
    let summary = pool(&driver, &urls, &products, &export_path, 4)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(driver.visited()[visited_before..], [addresses[2].clone()]);
    assert_eq!(products.all().await.len(), 4);

    let lines = csv_lines(&export_path);
    assert_eq!(lines.len(), 5);
    assert_eq!(lines.iter().filter(|l| l.starts_with("Name,")).count(), 1);
    // Missing rating is exported as zero
    assert!(lines.iter().any(|l| l.starts_with("Phone 4,") && l.contains(",400,0.00,")));
}
