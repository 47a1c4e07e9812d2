use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod errors;
mod export;
mod scraper;
mod types;
mod webdriver;
mod webdriver_manager;

use config::Config;
use scraper::HashtagScraper;
use webdriver::Browser;

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "tagscrape")]
#[command(about = "Scrape Instagram hashtag search results via WebDriver", long_about = None)]
struct Cli {
    /// Hashtag to search for (defaults to $INSTAGRAM_HASHTAG)
    #[arg(long)]
    hashtag: Option<String>,

    /// Browser to use: firefox or chrome (defaults to $BROWSER, then firefox)
    #[arg(short, long)]
    browser: Option<String>,

    /// Maximum number of posts to extract
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Maximum scroll passes while loading search results
    #[arg(long, default_value = "3")]
    max_scrolls: usize,

    /// Output CSV path
    #[arg(short, long, default_value = "instagram_scraped_data.csv")]
    output: PathBuf,

    /// Run browser in visible mode (disables headless)
    #[arg(long = "no-headless")]
    no_headless: bool,
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Always clean up WebDriver processes before exiting
    webdriver_manager::GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            // Convert to our error type to get the proper exit code
            let scrape_err: errors::ScrapeError = err.into();
            eprintln!("Error: {}", scrape_err);
            std::process::exit(scrape_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so redirected output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagscrape=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.hashtag, cli.browser)?;

    let browser = Browser::new(
        config.browser,
        config.driver_path.as_deref(),
        !cli.no_headless,
    )
    .await?;
    let scraper = HashtagScraper::new(browser, &config);

    // The session is closed whether or not scraping succeeded
    let scrape_result = scraper.run(cli.limit, cli.max_scrolls).await;
    if let Err(e) = scraper.close().await {
        warn!("Failed to close browser session: {:#}", e);
    }
    let records = scrape_result?;

    if records.is_empty() {
        warn!("No posts were extracted, skipping CSV write");
    } else {
        export::write_csv(&cli.output, &records)?;
        info!("Saved {} post(s) to {}", records.len(), cli.output.display());
    }

    Ok(())
}
