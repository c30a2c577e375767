use super::*;
use crate::config::settings::SelectorSettings;
use crate::domain::models::url::Url;
use crate::domain::repositories::url_repository::RepositoryError;
use crate::engines::scripted_engine::{ScriptedDriver, ScriptedPage};
use crate::infrastructure::export::csv_export::CsvExporter;
use crate::infrastructure::export::writer::ExportWriter;
use crate::infrastructure::repositories::memory::{
    InMemoryExportSink, InMemoryProductRepository, InMemoryUrlRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use std::collections::HashSet;
use uuid::Uuid;

// --- Mocks ---

mock! {
    pub UrlRepository {}
    #[async_trait]
    impl UrlRepository for UrlRepository {
        async fn insert_many(&self, addresses: Vec<String>) -> Result<Vec<Url>, RepositoryError>;
        async fn list_unscraped(&self) -> Result<Vec<Url>, RepositoryError>;
        async fn mark_scraped(&self, id: Uuid) -> Result<(), RepositoryError>;
        async fn existing_addresses(&self, addresses: &[String]) -> Result<HashSet<String>, RepositoryError>;
    }
}

// --- Helpers ---

fn address(i: usize) -> String {
    format!("https://shop.example/p/{}", i)
}

fn product_page(name: &str) -> ScriptedPage {
    let s = SelectorSettings::default();
    ScriptedPage::new()
        .text(&s.title, name)
        .text(&s.description, "A product")
        .text(&s.store_name, "Gadget Store")
        .text(&s.price, "Rp1.250.000")
        .text(&s.rating, "4.5")
        .attr(&s.image, "src", "https://cdn.example/p.jpg")
}

fn page_without_image(name: &str) -> ScriptedPage {
    let s = SelectorSettings::default();
    ScriptedPage::new()
        .text(&s.title, name)
        .text(&s.description, "A product")
        .text(&s.store_name, "Gadget Store")
        .text(&s.price, "Rp10.000")
}

fn scraper_settings(workers: usize) -> ScraperSettings {
    ScraperSettings {
        workers,
        queue_capacity: None,
        page_timeout_secs: 5,
        scroll_settle_ms: 0,
    }
}

struct Fixture {
    driver: ScriptedDriver,
    urls: InMemoryUrlRepository,
    products: InMemoryProductRepository,
    sink: InMemoryExportSink,
}

impl Fixture {
    fn new(driver: ScriptedDriver) -> Self {
        Self {
            driver,
            urls: InMemoryUrlRepository::new(),
            products: InMemoryProductRepository::new(),
            sink: InMemoryExportSink::new(),
        }
    }

    async fn seed(&self, count: usize) -> Vec<Url> {
        self.urls
            .insert_many((1..=count).map(address).collect())
            .await
            .unwrap()
    }

    fn pool(&self, workers: usize) -> ScrapeWorkerPool {
        ScrapeWorkerPool::new(
            Arc::new(self.driver.clone()),
            Arc::new(ProductExtractor::new(SelectorSettings::default())),
            Arc::new(self.urls.clone()),
            Arc::new(self.products.clone()),
            Arc::new(self.sink.clone()),
            &scraper_settings(workers),
        )
    }
}

// --- Tests ---

#[tokio::test]
async fn test_all_urls_succeed() {
    let mut driver = ScriptedDriver::new();
    for i in 1..=4 {
        driver = driver.with_page(&address(i), product_page(&format!("Product {}", i)));
    }
    let fixture = Fixture::new(driver);
    fixture.seed(4).await;

    let summary = fixture
        .pool(2)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        summary,
        ScrapeSummary {
            total: 4,
            succeeded: 4,
            failed: 0,
            cancelled: 0
        }
    );
    assert_eq!(fixture.products.all().await.len(), 4);
    assert_eq!(fixture.urls.scraped_count().await, 4);
    assert_eq!(fixture.sink.rows().await.len(), 4);
    assert!(fixture
        .products
        .all()
        .await
        .iter()
        .all(|p| p.price == "1250000" && p.rating == 4.5));
}

#[tokio::test]
async fn test_missing_image_fails_only_that_url() {
    let driver = ScriptedDriver::new()
        .with_page(&address(1), product_page("Product 1"))
        .with_page(&address(2), product_page("Product 2"))
        .with_page(&address(3), page_without_image("Product 3"))
        .with_page(&address(4), product_page("Product 4"));
    let fixture = Fixture::new(driver);
    fixture.seed(4).await;

    let err = fixture
        .pool(4)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ScrapeError::Failed {
            failed,
            total,
            first,
        } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 4);
            assert_eq!(first.address(), address(3));
            assert_eq!(first.step(), "extraction");
        }
        other => panic!("unexpected error: {other}"),
    }

    let products = fixture.products.all().await;
    assert_eq!(products.len(), 3);
    assert!(products.iter().all(|p| p.name != "Product 3"));
    assert_eq!(fixture.urls.scraped_count().await, 3);
    assert_eq!(fixture.sink.rows().await.len(), 3);

    let pending = fixture.urls.list_unscraped().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].address, address(3));
}

#[tokio::test]
async fn test_partial_failures_are_isolated() {
    // 10 URLs, 3 of which fail at different steps
    let mut driver = ScriptedDriver::new();
    for i in 1..=10 {
        driver = match i {
            2 => driver.with_broken_page(&address(i)),
            5 => driver.with_page(&address(i), page_without_image("Product 5")),
            // 8 is unknown to the driver and loads blank
            8 => driver,
            _ => driver.with_page(&address(i), product_page(&format!("Product {}", i))),
        };
    }
    let fixture = Fixture::new(driver);
    fixture.seed(10).await;

    let err = fixture
        .pool(3)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Failed {
            failed: 3,
            total: 10,
            ..
        }
    ));
    assert_eq!(fixture.products.all().await.len(), 7);
    assert_eq!(fixture.urls.scraped_count().await, 7);
    assert_eq!(fixture.sink.rows().await.len(), 7);
    assert_eq!(fixture.driver.opened_sessions(), 10);
    assert_eq!(fixture.driver.closed_sessions(), 10);
}

#[tokio::test]
async fn test_open_sessions_never_exceed_worker_count() {
    let mut driver = ScriptedDriver::new().with_navigation_delay(Duration::from_millis(10));
    for i in 1..=8 {
        driver = driver.with_page(&address(i), product_page(&format!("Product {}", i)));
    }
    let fixture = Fixture::new(driver);
    fixture.seed(8).await;

    fixture
        .pool(2)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap();

    assert!(fixture.driver.peak_open_sessions() <= 2);
    assert_eq!(fixture.driver.opened_sessions(), 8);
    assert_eq!(fixture.driver.closed_sessions(), 8);
}

#[tokio::test]
async fn test_persist_failure_leaves_url_pending() {
    let driver = ScriptedDriver::new()
        .with_page(&address(1), product_page("Good"))
        .with_page(&address(2), product_page("Broken"));
    let fixture = Fixture::new(driver);
    fixture.products.reject_name("Broken").await;
    fixture.seed(2).await;

    let err = fixture
        .pool(2)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ScrapeError::Failed { first, .. } => {
            assert_eq!(first.step(), "persist");
            assert_eq!(first.address(), address(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.urls.scraped_count().await, 1);
    assert_eq!(fixture.sink.rows().await.len(), 1);
}

#[tokio::test]
async fn test_mark_scraped_not_found_is_reported() {
    let stale = Url {
        id: Uuid::new_v4(),
        address: address(1),
        scraped: false,
        created_at: Utc::now().fixed_offset(),
        updated_at: Utc::now().fixed_offset(),
    };
    let mut urls = MockUrlRepository::new();
    urls.expect_list_unscraped()
        .times(1)
        .returning(move || Ok(vec![stale.clone()]));
    urls.expect_mark_scraped()
        .times(1)
        .returning(|_| Err(RepositoryError::NotFound));

    let driver = ScriptedDriver::new().with_page(&address(1), product_page("Product 1"));
    let products = InMemoryProductRepository::new();
    let sink = InMemoryExportSink::new();
    let pool = ScrapeWorkerPool::new(
        Arc::new(driver),
        Arc::new(ProductExtractor::new(SelectorSettings::default())),
        Arc::new(urls),
        Arc::new(products.clone()),
        Arc::new(sink.clone()),
        &scraper_settings(1),
    );

    let err = pool
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ScrapeError::Failed { first, .. } => {
            assert_eq!(first.step(), "mark_scraped");
            assert!(matches!(
                *first,
                UrlError::MarkScraped {
                    source: RepositoryError::NotFound,
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    // No rollback of the persisted product, no export
    assert_eq!(products.all().await.len(), 1);
    assert!(sink.rows().await.is_empty());
}

#[tokio::test]
async fn test_export_failure_after_flag_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let driver = ScriptedDriver::new().with_page(&address(1), product_page("Product 1"));
    let urls = InMemoryUrlRepository::new();
    urls.insert_many(vec![address(1)]).await.unwrap();
    // A directory cannot be opened as the export file
    let sink = ExportWriter::spawn(CsvExporter::new(dir.path()));

    let pool = ScrapeWorkerPool::new(
        Arc::new(driver),
        Arc::new(ProductExtractor::new(SelectorSettings::default())),
        Arc::new(urls.clone()),
        Arc::new(InMemoryProductRepository::new()),
        Arc::new(sink),
        &scraper_settings(1),
    );

    let err = pool
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ScrapeError::Failed { first, .. } => assert_eq!(first.step(), "export"),
        other => panic!("unexpected error: {other}"),
    }
    // The flag stays set even though the export row is missing
    assert_eq!(urls.scraped_count().await, 1);
}

#[tokio::test]
async fn test_cancelled_before_start_leaves_urls_pending() {
    let driver = ScriptedDriver::new().with_page(&address(1), product_page("Product 1"));
    let fixture = Fixture::new(driver);
    fixture.seed(3).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = fixture.pool(2).scrape_all_pending(&cancel).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.cancelled, 3);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(fixture.driver.opened_sessions(), 0);
    assert_eq!(fixture.urls.list_unscraped().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_cancel_mid_run_finishes_in_flight_urls() {
    let mut driver = ScriptedDriver::new().with_navigation_delay(Duration::from_millis(100));
    for i in 1..=6 {
        driver = driver.with_page(&address(i), product_page(&format!("Product {}", i)));
    }
    let fixture = Fixture::new(driver);
    fixture.seed(6).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let summary = fixture.pool(2).scrape_all_pending(&cancel).await.unwrap();

    assert_eq!(summary.total, 6);
    assert_eq!(summary.failed, 0);
    assert!(summary.succeeded >= 1);
    assert!(summary.cancelled >= 1);
    assert_eq!(summary.succeeded + summary.cancelled, summary.total);
    // Sessions started before the cancel were all completed and closed
    assert_eq!(fixture.driver.opened_sessions(), summary.succeeded);
    assert_eq!(
        fixture.driver.opened_sessions(),
        fixture.driver.closed_sessions()
    );
    assert_eq!(fixture.urls.scraped_count().await, summary.succeeded);
    assert_eq!(fixture.sink.rows().await.len(), summary.succeeded);
    assert_eq!(
        fixture.urls.list_unscraped().await.unwrap().len(),
        summary.cancelled
    );
}

#[tokio::test]
async fn test_no_pending_urls() {
    let fixture = Fixture::new(ScriptedDriver::new());

    let summary = fixture
        .pool(4)
        .scrape_all_pending(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary, ScrapeSummary::default());
    assert_eq!(fixture.driver.opened_sessions(), 0);
}

#[test]
fn test_summary_display() {
    let summary = ScrapeSummary {
        total: 4,
        succeeded: 3,
        failed: 1,
        cancelled: 0,
    };
    assert_eq!(
        summary.to_string(),
        "4 total, 3 succeeded, 1 failed, 0 cancelled"
    );
}
