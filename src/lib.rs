//! Book catalogue scraper.
//!
//! Fetches catalogue pages of a book-listing site, extracts one [`BookRecord`] per product
//! entry and writes the aggregate as JSON. Pages are either walked one after another
//! ([`pagination`]) or downloaded concurrently and parsed on a fixed pool of workers
//! ([`process`]).

mod error;
mod macros;

pub mod compare;
pub mod download;
pub mod extract;
pub mod model;
pub mod output;
pub mod pagination;
pub mod parse;
pub mod process;
pub mod request;

use chrono::{DateTime, Local};

pub use error::{Error, Result};
pub use model::{
    BookRecord, FailurePolicy, MergePolicy, PageBody, PageFailure, PageRequest, ScrapeResult,
};

/// Directory the raw HTML of every fetched page is saved under.
pub const RAW_PAGES_DIR: &str = "html_pages";
/// Directory the JSON results are written to.
pub const OUTPUT_DIR: &str = "scraped_data";
/// Output file of the concurrent pipeline.
pub const PIPELINE_FILE: &str = "books.json";
/// Output file of the sequential run.
pub const SEQUENTIAL_FILE: &str = "books_sync.json";
pub const DEFAULT_TEMPLATE: &str = "https://books.toscrape.com/catalogue/page-{}.html";
pub const DEFAULT_PAGES: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Rating used when an entry has no recognizable star marker.
pub const UNRATED: &str = "Unrated";
/// A catalogue page lists 20 books.
const ENTRIES_PER_PAGE: usize = 20;

/// Seconds between two timestamps, with microsecond precision.
pub fn elapsed_secs(from: DateTime<Local>, to: DateTime<Local>) -> f64 {
    (to - from)
        .num_microseconds()
        .map(|n| n as f64 / 1_000_000.0)
        .unwrap_or(0.0)
}

/// Number of parse workers to use when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
