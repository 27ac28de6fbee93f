use std::path::PathBuf;

use chrono::Local;

use crate::download::download_pages;
use crate::extract::extract_books;
use crate::output::{save_raw_page, write_json};
use crate::parse::parse_pages;
use crate::request::{build_client, fetch_page, FetchOptions};
use crate::{
    default_workers, elapsed_secs, info_time, FailurePolicy, PageBody, PageFailure, PageRequest,
    Result, ScrapeResult, DEFAULT_PAGES, DEFAULT_TEMPLATE, OUTPUT_DIR, PIPELINE_FILE,
    SEQUENTIAL_FILE,
};

/// Settings of a fixed page-range run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Page URL with a `{}` placeholder for the page number.
    pub template: String,
    /// Pages `1..=pages` are scraped.
    pub pages: usize,
    pub workers: usize,
    pub fetch: FetchOptions,
    pub on_error: FailurePolicy,
    pub output_dir: PathBuf,
    pub raw_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.into(),
            pages: DEFAULT_PAGES,
            workers: default_workers(),
            fetch: FetchOptions::default(),
            on_error: FailurePolicy::default(),
            output_dir: PathBuf::from(OUTPUT_DIR),
            raw_dir: None,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub pages: usize,
    pub records: usize,
    pub failures: Vec<PageFailure>,
    pub download_secs: f64,
    pub parse_secs: f64,
    pub total_secs: f64,
    pub output: PathBuf,
}

impl RunSummary {
    /// Nothing was scraped and at least one page failed.
    pub fn is_total_failure(&self) -> bool {
        self.records == 0 && !self.failures.is_empty()
    }
}

/// Downloads all pages concurrently, parses them on the worker pool and writes `books.json`.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    let start_time = Local::now();
    let requests = PageRequest::from_template(&config.template, 1..=config.pages)?;
    info_time!("Started downloading {} pages", requests.len());

    let downloaded = download_pages(&requests, &config.fetch, config.on_error).await?;
    let download_done = Local::now();
    info_time!(start_time, "Downloaded {} pages", downloaded.bodies.len());

    save_raw_pages(config, &downloaded.bodies).await?;

    let pages = downloaded.bodies.len();
    let parsed = parse_pages(downloaded.bodies, config.workers, config.on_error).await?;
    let parse_done = Local::now();
    info_time!(
        download_done,
        "Parsed {} books on {} workers",
        parsed.records.len(),
        config.workers
    );

    let records = parsed.records.len();
    let output = write_json(
        &config.output_dir,
        PIPELINE_FILE,
        &ScrapeResult::Flat(parsed.records),
    )
    .await?;

    let mut failures = downloaded.failures;
    failures.extend(parsed.failures);
    let summary = RunSummary {
        pages,
        records,
        failures,
        download_secs: elapsed_secs(start_time, download_done),
        parse_secs: elapsed_secs(download_done, parse_done),
        total_secs: elapsed_secs(start_time, Local::now()),
        output,
    };
    info_time!(start_time, "Scraping complete, {} books", summary.records);
    Ok(summary)
}

/// Fetches and parses the same page range one page at a time and writes `books_sync.json`.
/// Fetch and parse failures both follow `config.on_error`.
pub async fn run_sequential(config: &PipelineConfig) -> Result<RunSummary> {
    let start_time = Local::now();
    let requests = PageRequest::from_template(&config.template, 1..=config.pages)?;
    let client = build_client(&config.fetch)?;

    let mut pages = 0;
    let mut books = Vec::new();
    let mut failures = Vec::new();
    let (mut download_secs, mut parse_secs) = (0.0, 0.0);
    for req in &requests {
        let fetch_start = Local::now();
        let fetched = fetch_page(&client, req, &config.fetch).await;
        download_secs += elapsed_secs(fetch_start, Local::now());

        let body = match fetched {
            Ok(body) => body,
            Err(e) => match config.on_error {
                FailurePolicy::Abort => {
                    tracing::error!("Error fetching {}: {e}", req.url);
                    return Err(e.in_page(req.id));
                }
                FailurePolicy::Skip => {
                    tracing::warn!("Skipping page {}, error fetching {}: {e}", req.id, req.url);
                    failures.push(PageFailure::new(req.id, req.url.clone(), &e));
                    continue;
                }
            },
        };
        pages += 1;
        if let Some(dir) = &config.raw_dir {
            save_raw_page(dir, &body).await?;
        }

        let parse_start = Local::now();
        match extract_books(&body.html, &body.url) {
            Ok(found) => {
                tracing::info!("Found {} books on page {}", found.len(), body.id);
                books.extend(found);
            }
            Err(e) => match config.on_error {
                FailurePolicy::Abort => return Err(e.in_page(body.id)),
                FailurePolicy::Skip => {
                    tracing::warn!("Skipping page {}, couldn't parse it: {e}", body.id);
                    failures.push(PageFailure::new(body.id, body.url, &e));
                }
            },
        }
        parse_secs += elapsed_secs(parse_start, Local::now());
    }

    let records = books.len();
    let output = write_json(&config.output_dir, SEQUENTIAL_FILE, &ScrapeResult::Flat(books)).await?;

    let summary = RunSummary {
        pages,
        records,
        failures,
        download_secs,
        parse_secs,
        total_secs: elapsed_secs(start_time, Local::now()),
        output,
    };
    info_time!(start_time, "Scraped {} books sequentially", summary.records);
    Ok(summary)
}

async fn save_raw_pages(config: &PipelineConfig, bodies: &[PageBody]) -> Result<()> {
    if let Some(dir) = &config.raw_dir {
        for body in bodies {
            save_raw_page(dir, body).await?;
        }
    }
    Ok(())
}
