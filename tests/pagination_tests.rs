//! The serial pagination driver against a mock server.

mod common;

use std::time::Duration;

use book_scrap::pagination::{scrape_paginated, Pagination, ScrapeOptions};
use book_scrap::{FailurePolicy, MergePolicy, ScrapeResult};
use common::{catalogue_page, hits, mount_page, mount_status};
use wiremock::MockServer;

fn pagination(max_page: usize) -> Pagination {
    Pagination {
        start_page: 1,
        max_page,
        prefix: "/catalogue/page-".into(),
        suffix: ".html".into(),
    }
}

fn titles(result: &ScrapeResult) -> Vec<String> {
    let mut titles: Vec<_> = result.records().map(|b| b.title.clone()).collect();
    titles.sort();
    titles
}

async fn three_pages(server: &MockServer) {
    mount_page(server, "/catalogue/page-1.html", catalogue_page(&["Alpha", "Beta"]), Duration::ZERO).await;
    mount_page(server, "/catalogue/page-2.html", catalogue_page(&["Gamma", "Beta"]), Duration::ZERO).await;
    mount_page(server, "/catalogue/page-3.html", catalogue_page(&["Delta"]), Duration::ZERO).await;
    mount_page(server, "/catalogue/page-4.html", catalogue_page(&["Never"]), Duration::ZERO).await;
}

#[tokio::test]
async fn stops_at_max_page_and_merges_by_title() {
    let server = MockServer::start().await;
    three_pages(&server).await;

    let scraped = scrape_paginated(&server.uri(), Some(&pagination(3)), &ScrapeOptions::default())
        .await
        .expect("scrape");

    assert_eq!(scraped.pages, 3);
    assert_eq!(titles(&scraped.result), vec!["Alpha", "Beta", "Delta", "Gamma"]);
    assert_eq!(hits(&server, "/catalogue/page-4.html").await, 0);

    // The second "Beta" came from page 2, and links resolve against that page.
    let ScrapeResult::Keyed(map) = &scraped.result else {
        panic!("dedup produces a keyed result");
    };
    assert_eq!(map["Beta"].url, format!("{}/catalogue/beta/index.html", server.uri()));
}

#[tokio::test]
async fn append_keeps_duplicates() {
    let server = MockServer::start().await;
    three_pages(&server).await;

    let opts = ScrapeOptions {
        merge: MergePolicy::Append,
        ..Default::default()
    };
    let scraped = scrape_paginated(&server.uri(), Some(&pagination(3)), &opts)
        .await
        .expect("scrape");

    let in_order: Vec<_> = scraped.result.records().map(|b| b.title.as_str()).collect();
    assert_eq!(in_order, vec!["Alpha", "Beta", "Gamma", "Beta", "Delta"]);
}

#[tokio::test]
async fn fetch_failure_ends_the_walk() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", catalogue_page(&["Alpha"]), Duration::ZERO).await;
    mount_status(&server, "/catalogue/page-2.html", 404).await;
    mount_page(&server, "/catalogue/page-3.html", catalogue_page(&["Gamma"]), Duration::ZERO).await;

    let scraped = scrape_paginated(&server.uri(), Some(&pagination(3)), &ScrapeOptions::default())
        .await
        .expect("a fetch failure is not an error");

    assert_eq!(titles(&scraped.result), vec!["Alpha"]);
    assert_eq!(scraped.pages, 1);
    assert_eq!(scraped.failures.len(), 1);
    assert_eq!(scraped.failures[0].id, 2);
    assert_eq!(hits(&server, "/catalogue/page-3.html").await, 0);
}

#[tokio::test]
async fn without_pagination_only_base_url_is_scraped() {
    let server = MockServer::start().await;
    mount_page(&server, "/index.html", catalogue_page(&["Solo"]), Duration::ZERO).await;

    let scraped = scrape_paginated(&format!("{}/index.html", server.uri()), None, &ScrapeOptions::default())
        .await
        .expect("scrape");

    assert_eq!(scraped.pages, 1);
    assert_eq!(titles(&scraped.result), vec!["Solo"]);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn start_page_is_honored() {
    let server = MockServer::start().await;
    three_pages(&server).await;

    let p = Pagination {
        start_page: 2,
        ..pagination(3)
    };
    let scraped = scrape_paginated(&server.uri(), Some(&p), &ScrapeOptions::default())
        .await
        .expect("scrape");

    assert_eq!(scraped.pages, 2);
    assert_eq!(hits(&server, "/catalogue/page-1.html").await, 0);
}

#[tokio::test]
async fn raw_pages_are_saved() {
    let server = MockServer::start().await;
    three_pages(&server).await;
    let dir = tempfile::tempdir().expect("tempdir");

    let opts = ScrapeOptions {
        raw_dir: Some(dir.path().join("html_pages")),
        ..Default::default()
    };
    scrape_paginated(&server.uri(), Some(&pagination(2)), &opts)
        .await
        .expect("scrape");

    for page in 1..=2 {
        let saved = std::fs::read_to_string(dir.path().join(format!("html_pages/page_{page}.html")))
            .expect("raw page saved");
        assert!(saved.contains("product_pod"));
    }
    assert!(!dir.path().join("html_pages/page_3.html").exists());
}

#[tokio::test]
async fn broken_entry_respects_failure_policy() {
    let server = MockServer::start().await;
    mount_page(&server, "/catalogue/page-1.html", catalogue_page(&["Alpha"]), Duration::ZERO).await;
    let broken = catalogue_page(&["Broken"]).replace(r#"<p class="price_color">£20.00</p>"#, "");
    mount_page(&server, "/catalogue/page-2.html", broken, Duration::ZERO).await;
    mount_page(&server, "/catalogue/page-3.html", catalogue_page(&["Gamma"]), Duration::ZERO).await;

    let abort = scrape_paginated(&server.uri(), Some(&pagination(3)), &ScrapeOptions::default()).await;
    assert!(matches!(abort, Err(book_scrap::Error::Page { id: 2, .. })));

    let opts = ScrapeOptions {
        on_error: FailurePolicy::Skip,
        ..Default::default()
    };
    let scraped = scrape_paginated(&server.uri(), Some(&pagination(3)), &opts)
        .await
        .expect("skip policy keeps going");
    assert_eq!(titles(&scraped.result), vec!["Alpha", "Gamma"]);
    assert_eq!(scraped.failures[0].id, 2);
}

#[tokio::test]
async fn last_representable_page_ends_the_walk() {
    let server = MockServer::start().await;
    let last = format!("/catalogue/page-{}.html", usize::MAX);
    mount_page(&server, &last, catalogue_page(&["Omega"]), Duration::ZERO).await;

    let p = Pagination {
        start_page: usize::MAX,
        max_page: usize::MAX,
        ..pagination(1)
    };
    let scraped = scrape_paginated(&server.uri(), Some(&p), &ScrapeOptions::default())
        .await
        .expect("scrape");

    assert_eq!(scraped.pages, 1);
    assert_eq!(titles(&scraped.result), vec!["Omega"]);
    assert_eq!(hits(&server, &last).await, 1);
}
