use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

/// How often polling waits re-check the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser instance for WebDriver automation
pub struct Browser {
    client: Client,
}

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}. Use 'firefox' or 'chrome'.", s),
        }
    }
}

impl BrowserType {
    /// Name of the WebDriver binary for this browser
    pub fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

impl Browser {
    /// Create a new browser instance
    ///
    /// # Arguments
    /// * `browser_type` - Firefox or Chrome
    /// * `driver_path` - Optional path to the WebDriver binary
    /// * `headless` - Whether to run in headless mode
    pub async fn new(
        browser_type: BrowserType,
        driver_path: Option<&Path>,
        headless: bool,
    ) -> Result<Self> {
        info!("Connecting to {:?} WebDriver", browser_type);

        // Ensure WebDriver is running (will auto-start if needed)
        let webdriver_url = GLOBAL_WEBDRIVER_MANAGER
            .ensure_driver(&browser_type, driver_path)
            .await?;

        let mut caps = serde_json::Map::new();

        match &browser_type {
            BrowserType::Firefox => {
                let mut firefox_opts = serde_json::Map::new();
                let mut args = Vec::new();

                if headless {
                    args.push("--headless".to_string());
                }

                firefox_opts.insert("args".to_string(), json!(args));
                firefox_opts.insert(
                    "prefs".to_string(),
                    json!({ "dom.webnotifications.enabled": false }),
                );
                caps.insert("moz:firefoxOptions".to_string(), json!(firefox_opts));
            }
            BrowserType::Chrome => {
                let mut chrome_opts = serde_json::Map::new();
                let mut args = vec![
                    "--no-sandbox".to_string(),
                    "--start-maximized".to_string(),
                    "--disable-notifications".to_string(),
                ];

                if headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }

                chrome_opts.insert("args".to_string(), json!(args));
                caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
            }
        }

        debug!("Connecting to WebDriver at {}", webdriver_url);

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&webdriver_url)
            .await
            .context("Failed to connect to WebDriver")?;

        Ok(Browser { client })
    }

    /// Navigate and wait for the document to finish loading.
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);

        self.client.goto(url).await?;

        // Poll readiness instead of sleeping a fixed interval
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..40 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        Ok(())
    }

    /// Get the current URL
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    /// Wait for an element and return its text.
    ///
    /// A missing element is a soft failure: after `timeout` the result is
    /// `Ok(None)` and the miss is logged. Faults while reading an element
    /// that was found (stale references included) propagate.
    pub async fn wait_for_text(
        &self,
        locator: Locator<'_>,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.client.find(locator).await {
                Ok(element) => {
                    let text = element
                        .text()
                        .await
                        .context("Failed to read element text")?;
                    return Ok(Some(text));
                }
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    warn!("Timed out waiting for element {:?}: {}", locator, e);
                    return Ok(None);
                }
            }
        }
    }

    /// Wait for elements and return their texts.
    ///
    /// Returns an empty list after `timeout` when nothing matches.
    pub async fn wait_for_texts(
        &self,
        locator: Locator<'_>,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            let elements = self.client.find_all(locator).await.unwrap_or_default();
            if !elements.is_empty() {
                let mut texts = Vec::with_capacity(elements.len());
                for element in elements {
                    let text = element
                        .text()
                        .await
                        .context("Failed to read element text")?;
                    texts.push(text);
                }
                return Ok(texts);
            }
            if Instant::now() >= deadline {
                warn!("Timed out waiting for elements {:?}", locator);
                return Ok(Vec::new());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Type text into an element. The element must exist.
    pub async fn fill(&self, locator: Locator<'_>, text: &str) -> Result<()> {
        let element = self
            .client
            .find(locator)
            .await
            .context(format!("Element not found: {:?}", locator))?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Click an element. The element must exist.
    pub async fn click(&self, locator: Locator<'_>) -> Result<()> {
        let element = self
            .client
            .find(locator)
            .await
            .context(format!("Element not found: {:?}", locator))?;
        element.click().await?;
        Ok(())
    }

    /// Scroll to the bottom of the page repeatedly to trigger lazy loading.
    ///
    /// Stops early when the page height stops growing. After each scroll the
    /// height is polled rather than slept on.
    pub async fn scroll_to_bottom(&self, max_scrolls: usize) -> Result<()> {
        let mut last_height = self.page_height().await?;

        for scroll in 0..max_scrolls {
            self.client
                .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
                .await
                .context("Failed to scroll page")?;

            // Give the page up to 3 seconds to grow
            let deadline = Instant::now() + Duration::from_secs(3);
            let mut new_height = last_height;
            while Instant::now() < deadline {
                new_height = self.page_height().await?;
                if new_height > last_height {
                    break;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }

            if new_height == last_height {
                debug!("Page height unchanged after scroll {}, stopping", scroll + 1);
                break;
            }
            last_height = new_height;
        }

        Ok(())
    }

    async fn page_height(&self) -> Result<i64> {
        let height = self
            .client
            .execute("return document.body.scrollHeight;", vec![])
            .await
            .context("Failed to read page height")?;
        Ok(height.as_i64().unwrap_or(0))
    }

    /// Collect hrefs of anchors matched by `locator`, bounded by `limit`.
    pub async fn collect_links(&self, locator: Locator<'_>, limit: usize) -> Result<Vec<String>> {
        let anchors = self
            .client
            .find_all(locator)
            .await
            .context("Failed to search for post links")?;

        let mut links = Vec::new();
        for anchor in anchors {
            if links.len() >= limit {
                break;
            }
            if let Some(href) = anchor.attr("href").await? {
                links.push(href);
            }
        }

        info!("Discovered {} post link(s)", links.len());
        Ok(links)
    }

    /// Close the browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
