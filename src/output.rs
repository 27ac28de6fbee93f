use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::{fs, fs::File, io::AsyncWriteExt};

use crate::{info_time, PageBody, Result, ScrapeResult};

/// `scraped_data_<local timestamp>.json`
pub fn timestamped_file_name() -> String {
    format!("scraped_data_{}.json", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Pretty JSON with a 4 space indent. Non-ASCII text is written as is.
pub fn to_json(result: &ScrapeResult) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    result.serialize(&mut ser)?;
    Ok(buf)
}

/// Writes the result to `dir/file_name`, creating `dir` if needed.
pub async fn write_json(dir: &Path, file_name: &str, result: &ScrapeResult) -> Result<PathBuf> {
    let local_now = Local::now();
    fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);

    let mut file = File::create(&path).await?;
    file.write_all(&to_json(result)?).await?;
    file.flush().await?;
    info_time!(local_now, "Wrote {} books to file: {}", result.len(), path.display());

    Ok(path)
}

pub async fn read_json(path: &Path) -> Result<ScrapeResult> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Saves the raw HTML of a page as `dir/page_<id>.html`.
pub async fn save_raw_page(dir: &Path, body: &PageBody) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("page_{}.html", body.id));
    fs::write(&path, body.html.as_bytes()).await?;
    tracing::debug!("Saved page {} to {}", body.id, path.display());
    Ok(path)
}
