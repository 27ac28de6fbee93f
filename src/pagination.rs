use std::path::PathBuf;

use chrono::Local;

use crate::extract::extract_books;
use crate::output::save_raw_page;
use crate::request::{build_client, fetch_page, FetchOptions};
use crate::{
    info_time, FailurePolicy, MergePolicy, PageFailure, PageRequest, Result, ScrapeResult,
};

/// Splices page numbers into the base URL: `{base}{prefix}{page}{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub start_page: usize,
    /// Last page number to fetch, inclusive.
    pub max_page: usize,
    pub prefix: String,
    pub suffix: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            start_page: 1,
            max_page: 1,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl Pagination {
    pub fn page_url(&self, base_url: &str, page: usize) -> String {
        format!("{base_url}{}{page}{}", self.prefix, self.suffix)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    pub fetch: FetchOptions,
    pub merge: MergePolicy,
    pub on_error: FailurePolicy,
    /// Where to save the raw HTML of each page, if anywhere.
    pub raw_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Scraped {
    pub result: ScrapeResult,
    /// Number of pages fetched successfully.
    pub pages: usize,
    pub failures: Vec<PageFailure>,
}

/// Walks the pages one by one, merging the records of each into one result.
///
/// Without `pagination` only `base_url` itself is scraped. A page that can't be fetched
/// ends the walk; whatever was gathered up to that point is returned.
pub async fn scrape_paginated(
    base_url: &str,
    pagination: Option<&Pagination>,
    opts: &ScrapeOptions,
) -> Result<Scraped> {
    let start_time = Local::now();
    let client = build_client(&opts.fetch)?;

    let (first_page, max_page) = match pagination {
        Some(p) => (p.start_page, p.max_page),
        None => (1, 1),
    };

    let mut scraped = Scraped {
        result: ScrapeResult::new(opts.merge),
        pages: 0,
        failures: Vec::new(),
    };

    for current_page in first_page..=max_page {
        let url = match pagination {
            Some(p) => p.page_url(base_url, current_page),
            None => base_url.to_string(),
        };
        let req = PageRequest::new(current_page, &url)?;
        info_time!("Scraping URL: {}", req.url);

        let body = match fetch_page(&client, &req, &opts.fetch).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Error fetching URL {}: {e}", req.url);
                scraped.failures.push(PageFailure::new(req.id, req.url, &e));
                break;
            }
        };
        scraped.pages += 1;

        if let Some(dir) = &opts.raw_dir {
            save_raw_page(dir, &body).await?;
        }

        match extract_books(&body.html, &body.url) {
            Ok(books) => {
                tracing::info!("Found {} books on page {}", books.len(), current_page);
                scraped.result.merge(books);
            }
            Err(e) => match opts.on_error {
                FailurePolicy::Abort => return Err(e.in_page(current_page)),
                FailurePolicy::Skip => {
                    tracing::warn!("Skipping page {current_page}, couldn't parse it: {e}");
                    scraped.failures.push(PageFailure::new(body.id, body.url, &e));
                }
            },
        }
    }

    info_time!(
        start_time,
        "Scraped {} pages, {} books",
        scraped.pages,
        scraped.result.len()
    );
    Ok(scraped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_splices_prefix_and_suffix() {
        let p = Pagination {
            start_page: 2,
            max_page: 5,
            prefix: "catalogue/page-".into(),
            suffix: ".html".into(),
        };
        assert_eq!(
            p.page_url("https://books.toscrape.com/", 3),
            "https://books.toscrape.com/catalogue/page-3.html"
        );
    }

    #[test]
    fn default_is_a_single_page() {
        let p = Pagination::default();
        assert_eq!((p.start_page, p.max_page), (1, 1));
    }
}
