use tokio::task::JoinSet;

use crate::request::{build_client, fetch_page, FetchOptions};
use crate::{FailurePolicy, PageBody, PageFailure, PageRequest, Result};

/// Bodies of a download batch, in request order, and the pages that were skipped.
#[derive(Debug, Default)]
pub struct Downloaded {
    pub bodies: Vec<PageBody>,
    pub failures: Vec<PageFailure>,
}

/// Fetches every request at once over one client and waits for all of them.
///
/// The client lives for this call only. Bodies come back in the order of `requests`,
/// not in the order the responses arrived. With [`FailurePolicy::Abort`] the first
/// failure cancels the fetches still in flight and is returned tagged with its page id.
pub async fn download_pages(
    requests: &[PageRequest],
    opts: &FetchOptions,
    policy: FailurePolicy,
) -> Result<Downloaded> {
    let client = build_client(opts)?;

    let mut task_set = JoinSet::new();
    for (idx, req) in requests.iter().enumerate() {
        task_set.spawn({
            // Client uses Arc so we can clone cheaply
            let client = client.clone();
            let req = req.clone();
            let opts = opts.clone();
            async move { (idx, fetch_page(&client, &req, &opts).await) }
        });
    }

    let mut slots: Vec<Option<PageBody>> = vec![None; requests.len()];
    let mut failures = Vec::new();
    while let Some(task) = task_set.join_next().await {
        let (idx, res) = task?;
        let req = &requests[idx];
        match res {
            Ok(body) => {
                tracing::info!("Fetched page {} ({} bytes): {}", req.id, body.html.len(), req.url);
                slots[idx] = Some(body);
            }
            Err(e) => match policy {
                // Dropping the JoinSet aborts whatever is still running.
                FailurePolicy::Abort => {
                    tracing::error!("Error fetching {}: {e}", req.url);
                    return Err(e.in_page(req.id));
                }
                FailurePolicy::Skip => {
                    tracing::warn!("Skipping page {}, error fetching {}: {e}", req.id, req.url);
                    failures.push((idx, PageFailure::new(req.id, req.url.clone(), &e)));
                }
            },
        }
    }

    failures.sort_by_key(|(idx, _)| *idx);
    Ok(Downloaded {
        bodies: slots.into_iter().flatten().collect(),
        failures: failures.into_iter().map(|(_, f)| f).collect(),
    })
}

/// Fetches the requests one after another over one client. Stops at the first failure.
pub async fn download_sequential(requests: &[PageRequest], opts: &FetchOptions) -> Result<Vec<PageBody>> {
    let client = build_client(opts)?;
    let mut bodies = Vec::with_capacity(requests.len());
    for req in requests {
        let body = fetch_page(&client, req, opts)
            .await
            .map_err(|e| e.in_page(req.id))?;
        tracing::info!("Fetched page {} ({} bytes): {}", req.id, body.html.len(), req.url);
        bodies.push(body);
    }
    Ok(bodies)
}
