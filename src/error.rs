use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't build selector: {0}")]
    InvalidSelector(String),
    #[error("Entry is missing a required field: {field}")]
    MissingField { field: &'static str },

    #[error("Page template must contain a `{{}}` placeholder: {0}")]
    InvalidTemplate(String),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Page {id} failed: {source}")]
    Page {
        id: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Url Error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Tags the error with the page it came from.
    pub fn in_page(self, id: usize) -> Self {
        match self {
            e @ Error::Page { .. } => e,
            e => Error::Page {
                id,
                source: Box::new(e),
            },
        }
    }

    /// Transport failures and server errors, the ones worth another attempt.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
