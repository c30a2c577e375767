// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::*;
use migration::{Migrator, MigratorTrait};
use prodcrawl::config::settings::SelectorSettings;
use prodcrawl::domain::repositories::url_repository::UrlRepository;
use prodcrawl::domain::services::link_harvester::{HarvestError, LinkHarvester};
use prodcrawl::domain::services::product_extractor::ProductExtractor;
use prodcrawl::infrastructure::export::csv_export::CsvExporter;
use prodcrawl::infrastructure::export::writer::ExportWriter;
use prodcrawl::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use prodcrawl::infrastructure::repositories::url_repo_impl::UrlRepositoryImpl;
use prodcrawl::workers::ScrapeWorkerPool;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(db.get_database_backend(), sql))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}

#[tokio::test]
async fn test_pipeline_against_sqlite() {
    let db = setup_db().await;
    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("out").join("data.csv");
    let driver = catalog(2, 6);
    let url_repo = Arc::new(UrlRepositoryImpl::new(db.clone()));
    let cancel = CancellationToken::new();

    let discovered = LinkHarvester::new(
        Arc::new(driver.clone()),
        url_repo.clone(),
        LISTING_TEMPLATE,
        SelectorSettings::default().product_link,
        10,
    )
    .discover_links(8, &cancel)
    .await
    .unwrap();
    assert_eq!(discovered.len(), 8);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM urls WHERE scraped = 0").await, 8);

    let summary = ScrapeWorkerPool::new(
        Arc::new(driver.clone()),
        Arc::new(ProductExtractor::new(SelectorSettings::default())),
        url_repo.clone(),
        Arc::new(ProductRepositoryImpl::new(db.clone())),
        Arc::new(ExportWriter::spawn(CsvExporter::new(&export_path))),
        &scraper_settings(3),
    )
    .scrape_all_pending(&cancel)
    .await
    .unwrap();

    assert_eq!(summary.succeeded, 8);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM products").await, 8);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM urls WHERE scraped = 1").await, 8);
    assert!(url_repo.list_unscraped().await.unwrap().is_empty());

    let content = std::fs::read_to_string(&export_path).unwrap();
    assert_eq!(content.lines().count(), 9);
}

#[tokio::test]
async fn test_exhausted_listing_persists_nothing() {
    let db = setup_db().await;
    let driver = catalog(2, 6);

    let err = LinkHarvester::new(
        Arc::new(driver),
        Arc::new(UrlRepositoryImpl::new(db.clone())),
        LISTING_TEMPLATE,
        SelectorSettings::default().product_link,
        10,
    )
    .discover_links(20, &CancellationToken::new())
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::ListingExhausted {
            pages: 3,
            found: 12,
            target: 20
        }
    ));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM urls").await, 0);
}
