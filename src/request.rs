use std::time::Duration;

use reqwest::Client;

use crate::{PageBody, PageRequest, Result, DEFAULT_TIMEOUT_SECS};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetch settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a transient failure. 0 means a single attempt.
    pub retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

pub fn build_client(opts: &FetchOptions) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(opts.timeout)
        .build()?)
}

/// Requests a page and returns its HTML.
/// Non-success statuses are errors, transient failures are retried `opts.retries` times.
pub async fn fetch_page(client: &Client, req: &PageRequest, opts: &FetchOptions) -> Result<PageBody> {
    let mut attempt = 0;
    loop {
        match request_page_html(client, req).await {
            Ok(html) => {
                return Ok(PageBody {
                    id: req.id,
                    url: req.url.clone(),
                    html,
                })
            }
            Err(e) if attempt < opts.retries && e.is_transient() => {
                let delay = opts.backoff * 2u32.saturating_pow(attempt);
                tracing::warn!(
                    "Fetching {} failed ({e}), retrying in {:?}",
                    req.url,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn request_page_html(client: &Client, req: &PageRequest) -> Result<String> {
    tracing::debug!("GET {}", req.url);
    let res = client.get(req.url.clone()).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(crate::Error::Status {
            url: req.url.to_string(),
            status: status.as_u16(),
        });
    }
    // The site serves UTF-8, whatever the headers claim.
    let bytes = res.bytes().await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
