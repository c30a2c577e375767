// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prodcrawl::config::settings::{ScraperSettings, SelectorSettings};
use prodcrawl::engines::scripted_engine::{ScriptedDriver, ScriptedPage};

pub const LISTING_TEMPLATE: &str = "https://shop.example/search?q=phone&page={page}";

pub fn listing_url(page: u32) -> String {
    LISTING_TEMPLATE.replace("{page}", &page.to_string())
}

pub fn product_url(page: u32, index: usize) -> String {
    format!("https://shop.example/p/{}-{}", page, index)
}

/// 完整的详情页
pub fn product_page(name: &str, price: &str, rating: Option<&str>) -> ScriptedPage {
    let s = SelectorSettings::default();
    let page = ScriptedPage::new()
        .text(&s.title, name)
        .text(&s.description, &format!("{} description", name))
        .text(&s.store_name, "Gadget Store")
        .text(&s.price, price)
        .attr(&s.image, "src", "https://cdn.example/p.jpg");
    match rating {
        Some(rating) => page.text(&s.rating, rating),
        None => page,
    }
}

/// 缺少主图的详情页
pub fn product_page_without_image(name: &str) -> ScriptedPage {
    let s = SelectorSettings::default();
    ScriptedPage::new()
        .text(&s.title, name)
        .text(&s.description, "no image")
        .text(&s.store_name, "Gadget Store")
        .text(&s.price, "Rp5.000")
}

/// 构建 `pages` 页列表、每页 `per_page` 个链接的商品目录，所有详情页都可抓取
pub fn catalog(pages: u32, per_page: usize) -> ScriptedDriver {
    let selectors = SelectorSettings::default();
    let mut driver = ScriptedDriver::new();
    for page in 1..=pages {
        let hrefs: Vec<String> = (0..per_page)
            .map(|i| format!("/p/{}-{}", page, i))
            .collect();
        driver = driver.with_page(
            &listing_url(page),
            ScriptedPage::new().links(&selectors.product_link, hrefs),
        );
        for i in 0..per_page {
            driver = driver.with_page(
                &product_url(page, i),
                product_page(&format!("Phone {}-{}", page, i), "Rp1.250.000", Some("4.8")),
            );
        }
    }
    driver
}

pub fn scraper_settings(workers: usize) -> ScraperSettings {
    ScraperSettings {
        workers,
        queue_capacity: None,
        page_timeout_secs: 5,
        scroll_settle_ms: 0,
    }
}
