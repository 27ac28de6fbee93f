use std::ops::RangeInclusive;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// One unit of fetch work: a page number (or sequence index) and its resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub id: usize,
    pub url: Url,
}

impl PageRequest {
    pub fn new(id: usize, url: &str) -> Result<Self> {
        Ok(Self {
            id,
            url: Url::parse(url)?,
        })
    }

    /// Builds one request per page number, substituting it for the `{}` in `template`.
    pub fn from_template(template: &str, pages: RangeInclusive<usize>) -> Result<Vec<Self>> {
        if !template.contains("{}") {
            return Err(Error::InvalidTemplate(template.into()));
        }
        pages
            .map(|page| Self::new(page, &template.replacen("{}", &page.to_string(), 1)))
            .collect()
    }
}

/// Raw text of a fetched page, tagged with the request it answers.
#[derive(Debug, Clone)]
pub struct PageBody {
    pub id: usize,
    pub url: Url,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub url: String,
    pub price: String,
    pub availability: String,
    pub rating: String,
}

/// Aggregated output of one run.
///
/// `Keyed` serializes as an object keyed by title in first-seen order, `Flat` as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeResult {
    Keyed(IndexMap<String, BookRecord>),
    Flat(Vec<BookRecord>),
}

impl ScrapeResult {
    pub fn new(policy: MergePolicy) -> Self {
        match policy {
            MergePolicy::Dedup => ScrapeResult::Keyed(IndexMap::new()),
            MergePolicy::Append => ScrapeResult::Flat(Vec::new()),
        }
    }

    /// Adds records. When keyed, a record with an already seen title replaces the old one
    /// in its original position.
    pub fn merge(&mut self, records: impl IntoIterator<Item = BookRecord>) {
        match self {
            ScrapeResult::Keyed(map) => {
                for record in records {
                    map.insert(record.title.clone(), record);
                }
            }
            ScrapeResult::Flat(list) => list.extend(records),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScrapeResult::Keyed(map) => map.len(),
            ScrapeResult::Flat(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Box<dyn Iterator<Item = &BookRecord> + '_> {
        match self {
            ScrapeResult::Keyed(map) => Box::new(map.values()),
            ScrapeResult::Flat(list) => Box::new(list.iter()),
        }
    }
}

/// A page left out of the result and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub id: usize,
    pub url: Url,
    pub reason: String,
}

impl PageFailure {
    pub fn new(id: usize, url: Url, err: &Error) -> Self {
        Self {
            id,
            url,
            reason: err.to_string(),
        }
    }
}

/// How records from successive pages are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MergePolicy {
    /// Key by title, later duplicates overwrite earlier ones.
    #[default]
    Dedup,
    /// Keep every record in page order.
    Append,
}

/// What a failing page does to the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// The first failing page fails the whole batch.
    #[default]
    Abort,
    /// Failing pages are logged, reported and left out.
    Skip,
}
