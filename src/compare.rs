use chrono::Local;
use url::Url;

use crate::download::{download_pages, download_sequential};
use crate::request::FetchOptions;
use crate::{elapsed_secs, info_time, FailurePolicy, PageRequest, Result};

pub const DEFAULT_COMPARE_URLS: [&str; 5] = ["https://httpbin.org/delay/3"; 5];

/// Timings of fetching the same URLs one by one and all at once.
#[derive(Debug)]
pub struct FetchComparison {
    pub sequential_secs: f64,
    pub concurrent_secs: f64,
    /// Body length of each URL, `(sequential, concurrent)`, in input order.
    pub lengths: Vec<(usize, usize)>,
}

impl FetchComparison {
    pub fn speedup(&self) -> f64 {
        self.sequential_secs / self.concurrent_secs.max(f64::EPSILON)
    }
}

/// Fetches `urls` sequentially and then concurrently, timing both runs.
/// Any failed request fails the comparison.
pub async fn compare_fetch(urls: &[Url], opts: &FetchOptions) -> Result<FetchComparison> {
    let requests: Vec<_> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| PageRequest {
            id: i + 1,
            url: url.clone(),
        })
        .collect();

    let start_time = Local::now();
    let seq = download_sequential(&requests, opts).await?;
    let seq_done = Local::now();
    info_time!(start_time, "Sequential fetch of {} URLs", seq.len());

    let conc = download_pages(&requests, opts, FailurePolicy::Abort).await?;
    let conc_done = Local::now();
    info_time!(seq_done, "Concurrent fetch of {} URLs", conc.bodies.len());

    let lengths = seq
        .iter()
        .zip(&conc.bodies)
        .map(|(s, c)| (s.html.len(), c.html.len()))
        .collect();

    Ok(FetchComparison {
        sequential_secs: elapsed_secs(start_time, seq_done),
        concurrent_secs: elapsed_secs(seq_done, conc_done),
        lengths,
    })
}
