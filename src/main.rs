use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use book_scrap::{
    compare::{compare_fetch, DEFAULT_COMPARE_URLS},
    default_workers, info_time,
    output::{timestamped_file_name, to_json, write_json},
    pagination::{scrape_paginated, Pagination, ScrapeOptions},
    process::{run_pipeline, run_sequential, PipelineConfig, RunSummary},
    request::FetchOptions,
    FailurePolicy, MergePolicy, Result, DEFAULT_PAGES, DEFAULT_TEMPLATE, DEFAULT_TIMEOUT_SECS,
    OUTPUT_DIR, RAW_PAGES_DIR,
};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Scrapes book catalogue pages into JSON.
#[derive(Parser, Debug)]
#[command(name = "book-scrap")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Retries on transport failures and 5xx responses, with exponential backoff
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,

    /// What a failing page does to the rest of the run
    #[arg(long, global = true, value_enum, default_value_t = FailurePolicy::Abort)]
    on_error: FailurePolicy,

    /// Directory the JSON result is written to
    #[arg(long, global = true, default_value = OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Directory raw pages are saved to
    #[arg(long, global = true, default_value = RAW_PAGES_DIR)]
    raw_dir: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a page, or a numbered range of pages, one after another
    Paginate {
        /// Base URL to scrape
        url: String,
        /// Starting page number, enables pagination
        #[arg(long)]
        page: Option<usize>,
        /// Text between the base URL and the page number
        #[arg(long, default_value = "")]
        prefix: String,
        /// Text after the page number
        #[arg(long, default_value = "")]
        suffix: String,
        /// Last page number to scrape
        #[arg(long, default_value_t = 1)]
        max_page: usize,
        /// Key records by title, or keep every record
        #[arg(long, value_enum, default_value_t = MergePolicy::Dedup)]
        merge: MergePolicy,
    },
    /// Download a page range concurrently and parse it on a worker pool
    Pipeline {
        #[command(flatten)]
        range: RangeArgs,
        /// Number of parse workers, defaults to the number of CPUs
        #[arg(long)]
        workers: Option<usize>,
        /// Save every downloaded page to the raw pages directory
        #[arg(long)]
        save_raw: bool,
    },
    /// Fetch and parse the same page range one page at a time
    Sequential {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Time fetching a list of URLs sequentially against concurrently
    Compare {
        /// URLs to fetch
        urls: Vec<Url>,
    },
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Page URL with `{}` in place of the page number
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: String,
    /// Number of pages, starting from 1
    #[arg(long, default_value_t = DEFAULT_PAGES)]
    pages: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.global.verbose, cli.global.quiet);

    let start_time = Local::now();
    let res = run(cli).await;
    info_time!(start_time, "Full program time:");

    match res {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("book_scrap=info,warn"),
            1 => EnvFilter::new("book_scrap=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs the command. `Ok(false)` means nothing was scraped.
async fn run(cli: Cli) -> Result<bool> {
    let global = cli.global;
    let fetch = FetchOptions {
        timeout: Duration::from_secs(global.timeout),
        retries: global.retries,
        ..Default::default()
    };

    match cli.command {
        Command::Paginate {
            url,
            page,
            prefix,
            suffix,
            max_page,
            merge,
        } => {
            let pagination = page.map(|start_page| Pagination {
                start_page,
                max_page,
                prefix,
                suffix,
            });
            let opts = ScrapeOptions {
                fetch,
                merge,
                on_error: global.on_error,
                raw_dir: Some(global.raw_dir),
            };

            let scraped = scrape_paginated(&url, pagination.as_ref(), &opts).await?;
            println!("{}", String::from_utf8_lossy(&to_json(&scraped.result)?));
            write_json(&global.output_dir, &timestamped_file_name(), &scraped.result).await?;

            if scraped.result.is_empty() && !scraped.failures.is_empty() {
                tracing::error!("No books scraped, {} pages failed", scraped.failures.len());
                return Ok(false);
            }
            tracing::info!("Scraping completed successfully.");
            Ok(true)
        }
        Command::Pipeline {
            range,
            workers,
            save_raw,
        } => {
            let config = PipelineConfig {
                template: range.template,
                pages: range.pages,
                workers: workers.unwrap_or_else(default_workers),
                fetch,
                on_error: global.on_error,
                output_dir: global.output_dir,
                raw_dir: save_raw.then_some(global.raw_dir),
            };
            Ok(report(&run_pipeline(&config).await?))
        }
        Command::Sequential { range } => {
            let config = PipelineConfig {
                template: range.template,
                pages: range.pages,
                fetch,
                on_error: global.on_error,
                output_dir: global.output_dir,
                ..Default::default()
            };
            Ok(report(&run_sequential(&config).await?))
        }
        Command::Compare { urls } => {
            let urls = if urls.is_empty() {
                DEFAULT_COMPARE_URLS
                    .iter()
                    .map(|u| Url::parse(u))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            } else {
                urls
            };

            let cmp = compare_fetch(&urls, &fetch).await?;
            println!("Synchronous fetch took {:.2} seconds", cmp.sequential_secs);
            println!("Asynchronous fetch took {:.2} seconds", cmp.concurrent_secs);
            for (i, (s, a)) in cmp.lengths.iter().enumerate() {
                println!("URL {} -> sync len={s}, async len={a}", i + 1);
            }
            println!("Speedup: {:.1}x", cmp.speedup());
            Ok(true)
        }
    }
}

fn report(summary: &RunSummary) -> bool {
    println!(
        "Downloaded {} pages in {:.2}s",
        summary.pages, summary.download_secs
    );
    println!("Parsed {} books in {:.2}s", summary.records, summary.parse_secs);
    for failure in &summary.failures {
        println!("Skipped page {} ({}): {}", failure.id, failure.url, failure.reason);
    }
    println!(
        "Wrote {} in {:.2}s total",
        summary.output.display(),
        summary.total_secs
    );
    !summary.is_total_failure()
}
