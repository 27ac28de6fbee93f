use std::sync::Arc;

use tokio::{
    sync::Semaphore,
    task::{spawn_blocking, JoinSet},
};
use url::Url;

use crate::extract::extract_books;
use crate::{BookRecord, FailurePolicy, PageBody, PageFailure, Result};

/// Flattened records of a parse batch.
#[derive(Debug, Default)]
pub struct Parsed {
    /// Records of every parsed page, concatenated in submission order.
    pub records: Vec<BookRecord>,
    /// Record count of each parsed page, `(page id, count)`, in submission order.
    pub per_page: Vec<(usize, usize)>,
    pub failures: Vec<PageFailure>,
}

/// Parses the bodies on a pool of `workers` blocking threads and flattens the results.
///
/// Each worker gets one body and returns its records, nothing is shared between them.
/// Results are concatenated in the order of `bodies`, whichever worker finishes first.
pub async fn parse_pages(bodies: Vec<PageBody>, workers: usize, policy: FailurePolicy) -> Result<Parsed> {
    parse_pages_with(bodies, workers, policy, extract_books).await
}

/// [`parse_pages`] with the per-page parse function passed in.
pub(crate) async fn parse_pages_with<F>(
    bodies: Vec<PageBody>,
    workers: usize,
    policy: FailurePolicy,
    parse: F,
) -> Result<Parsed>
where
    F: Fn(&str, &Url) -> Result<Vec<BookRecord>> + Send + Sync + 'static,
{
    let pool = Arc::new(Semaphore::new(workers.max(1)));
    let parse = Arc::new(parse);
    let total = bodies.len();

    let mut task_set = JoinSet::new();
    for (idx, body) in bodies.into_iter().enumerate() {
        let pool = pool.clone();
        let parse = parse.clone();
        task_set.spawn(async move {
            // The semaphore is never closed.
            let _permit = pool.acquire_owned().await;
            let (id, url) = (body.id, body.url.clone());
            let res = spawn_blocking(move || parse(&body.html, &body.url)).await;
            (idx, id, url, res)
        });
    }

    let mut pages: Vec<Option<(usize, Vec<BookRecord>)>> = vec![None; total];
    let mut failures = Vec::new();
    while let Some(task) = task_set.join_next().await {
        let (idx, id, url, res) = task?;
        match res? {
            Ok(books) => {
                tracing::info!("Found {} books on page {}", books.len(), id);
                pages[idx] = Some((id, books));
            }
            Err(e) => match policy {
                FailurePolicy::Abort => {
                    tracing::error!("Couldn't parse page {id} ({url}): {e}");
                    return Err(e.in_page(id));
                }
                FailurePolicy::Skip => {
                    tracing::warn!("Skipping page {id} ({url}), couldn't parse it: {e}");
                    failures.push((idx, PageFailure::new(id, url, &e)));
                }
            },
        }
    }

    failures.sort_by_key(|(idx, _)| *idx);
    let mut parsed = Parsed {
        failures: failures.into_iter().map(|(_, f)| f).collect(),
        ..Default::default()
    };
    for (id, books) in pages.into_iter().flatten() {
        parsed.per_page.push((id, books.len()));
        parsed.records.extend(books);
    }
    Ok(parsed)
}
