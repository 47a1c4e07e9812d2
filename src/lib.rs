//! # tagscrape
//!
//! CLI scraper for Instagram hashtag searches, driven over WebDriver.
//!
//! Logs into Instagram, opens the keyword search for a hashtag, scrolls to
//! load results, then visits each discovered post and extracts the author
//! handle, cleaned body text, reaction count, comments, and hashtags into a
//! CSV file.
//!
//! ## CLI Usage
//!
//! ```bash
//! export INSTAGRAM_USERNAME=me INSTAGRAM_PASSWORD=secret
//! tagscrape --hashtag "aluvion baños" --limit 10
//!
//! # Use Chrome instead of Firefox (default)
//! tagscrape --hashtag rustlang --browser chrome
//!
//! # Point at a specific driver binary
//! DRIVER_PATH=/opt/geckodriver tagscrape --hashtag rustlang
//! ```
//!
//! Extraction is deliberately forgiving: a post whose content selectors both
//! miss is recorded with a placeholder, a stale element reference is retried
//! a bounded number of times, and any other per-post fault abandons that URL
//! without failing the batch.
//!
//! ## Library Usage
//!
//! ```no_run
//! use tagscrape::{Browser, BrowserType, HashtagScraper};
//! use tagscrape::config::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::resolve(Some("rustlang".into()), None)?;
//! let browser = Browser::new(config.browser, None, true).await?;
//! let scraper = HashtagScraper::new(browser, &config);
//! let records = scraper.run(10, 3).await?;
//! scraper.close().await?;
//! # Ok(())
//! # }
//! ```

/// Run configuration from environment and CLI
pub mod config;

/// Error taxonomy and exit codes
pub mod errors;

/// CSV export
pub mod export;

/// Login, navigation, and the post extraction loop
pub mod scraper;

/// Record types
pub mod types;

/// WebDriver browser control
pub mod webdriver;

/// Automatic WebDriver process management
pub mod webdriver_manager;

pub use config::Config;
pub use scraper::{collect_posts, HashtagScraper, PostSource};
pub use types::{PostRecord, RawPost};
pub use webdriver::{Browser, BrowserType};
