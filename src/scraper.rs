use std::time::Duration;

use anyhow::{Context, Result};
use fantoccini::Locator;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::errors;
use crate::types::{author_from_url, PostRecord, RawPost};
use crate::webdriver::Browser;

const LOGIN_URL: &str = "https://www.instagram.com/accounts/login/";
const SEARCH_URL: &str = "https://www.instagram.com/explore/search/keyword/";

/// Anchors of individual posts in the search results
const POST_LINK_XPATH: &str = "//a[contains(@href, '/p/')]";

/// Primary selector for the post body text
const CONTENT_XPATH: &str = "//div[contains(@class, 'x9f619') and contains(@class, 'xjbqb8w')]//span[contains(@class, 'x1lliihq')]";
/// Alternate selector, tried when the primary misses; also matches the
/// comment spans
const CONTENT_ALT_XPATH: &str = "//div[contains(@class, 'x9f619')]//span[@dir='auto']";
/// Reaction counter ("me gusta" is the literal the page renders)
const REACTIONS_XPATH: &str = "//section//div[contains(text(),'me gusta')]";

/// Placeholder when neither content selector matched
pub const CONTENT_UNAVAILABLE: &str = "Content not available";
/// Placeholder when no reaction count could be read
pub const REACTIONS_UNAVAILABLE: &str = "Reactions not available";

/// Attempts per URL; only stale element faults trigger another attempt
pub const MAX_ATTEMPTS: usize = 3;
/// Pause between attempts after a stale element fault
const RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Ceiling for element presence waits
const ELEMENT_WAIT: Duration = Duration::from_secs(20);
/// Reactions are best-effort, so their wait is shorter
const REACTIONS_WAIT: Duration = Duration::from_secs(5);
/// Ceiling for the post-login redirect
const LOGIN_WAIT: Duration = Duration::from_secs(30);

lazy_static! {
    /// Site chrome appended below the post text (footer through nav labels)
    static ref META_FOOTER: Regex = Regex::new(
        r"(?s)Meta; Información; Blog;.*?© \d{4} Instagram from Meta; Inicio; Buscar; Explorar;.*"
    )
    .unwrap();
    /// Empty-comment-section prompt
    static ref CONVERSATION_PROMPT: Regex = Regex::new(r"Inicia la conversación\.;?").unwrap();
    static ref HASHTAG: Regex = Regex::new(r"#\w+").unwrap();
    static ref REACTION_COUNT: Regex = Regex::new(r"[\d,.]+").unwrap();
}

/// Source of raw post captures, one per URL.
///
/// `Browser` is the real implementation; tests script their own.
#[allow(async_fn_in_trait)]
pub trait PostSource {
    async fn load_post(&self, url: &str) -> Result<RawPost>;
}

impl PostSource for Browser {
    async fn load_post(&self, url: &str) -> Result<RawPost> {
        self.goto(url).await?;

        let primary = self
            .wait_for_text(Locator::XPath(CONTENT_XPATH), ELEMENT_WAIT)
            .await?;
        let alternate = if primary.is_none() {
            info!("Primary content selector missed, trying the alternate...");
            self.wait_for_text(Locator::XPath(CONTENT_ALT_XPATH), ELEMENT_WAIT)
                .await?
        } else {
            None
        };

        // Best-effort: a missing or unreadable counter never fails the post
        let reactions = match self
            .wait_for_text(Locator::XPath(REACTIONS_XPATH), REACTIONS_WAIT)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                debug!("Could not read reactions for {}: {:#}", url, e);
                None
            }
        };

        let comments = self
            .wait_for_texts(Locator::XPath(CONTENT_ALT_XPATH), ELEMENT_WAIT)
            .await?;

        Ok(RawPost {
            primary,
            alternate,
            reactions,
            comments,
        })
    }
}

/// Drives one scraping run: login, hashtag search, scroll, extraction.
pub struct HashtagScraper {
    browser: Browser,
    username: String,
    password: String,
    hashtag: String,
}

impl HashtagScraper {
    pub fn new(browser: Browser, config: &Config) -> Self {
        Self {
            browser,
            username: config.username.clone(),
            password: config.password.clone(),
            hashtag: config.hashtag.clone(),
        }
    }

    /// Log into Instagram. Missing login fields or button abort the run.
    pub async fn login(&self) -> Result<()> {
        info!("Logging in as {}", self.username);
        self.browser.goto(LOGIN_URL).await?;

        self.browser
            .fill(Locator::Css("input[name='username']"), &self.username)
            .await
            .context("Could not find the username field on the login page")?;
        self.browser
            .fill(Locator::Css("input[name='password']"), &self.password)
            .await
            .context("Could not find the password field on the login page")?;
        self.browser
            .click(Locator::Css("button[type='submit']"))
            .await
            .context("Could not find the login button")?;

        self.wait_for_login().await?;
        info!("Login successful");
        Ok(())
    }

    /// Poll until the browser has navigated away from the login form.
    async fn wait_for_login(&self) -> Result<()> {
        let deadline = std::time::Instant::now() + LOGIN_WAIT;
        loop {
            let url = self.browser.current_url().await?;
            if !url.contains("/accounts/login") {
                return Ok(());
            }
            if std::time::Instant::now() >= deadline {
                anyhow::bail!("Login did not complete: still on the login page");
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    /// Navigate to the keyword search for the configured hashtag.
    pub async fn open_hashtag_search(&self) -> Result<()> {
        let url = Url::parse_with_params(SEARCH_URL, &[("q", self.hashtag.as_str())])
            .context("Failed to build hashtag search URL")?;
        self.browser.goto(url.as_str()).await
    }

    /// Scroll the results page to load more posts.
    pub async fn load_posts(&self, max_scrolls: usize) -> Result<()> {
        self.browser.scroll_to_bottom(max_scrolls).await
    }

    /// URLs of the discovered posts, bounded by `limit`.
    pub async fn discover_posts(&self, limit: usize) -> Result<Vec<String>> {
        self.browser
            .collect_links(Locator::XPath(POST_LINK_XPATH), limit)
            .await
    }

    /// Full run: login, search, scroll, extract.
    pub async fn run(&self, limit: usize, max_scrolls: usize) -> Result<Vec<PostRecord>> {
        self.login().await?;
        self.open_hashtag_search().await?;
        self.load_posts(max_scrolls).await?;
        let urls = self.discover_posts(limit).await?;
        Ok(collect_posts(&self.browser, &urls, limit).await)
    }

    /// Close the browser session. Must run even when scraping failed.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }
}

/// Visit each URL and extract a record.
///
/// Per URL: up to [`MAX_ATTEMPTS`] tries. A stale element fault backs off
/// and retries; any other fault abandons the URL and the loop moves on, so
/// a bad post never fails the batch.
pub async fn collect_posts<S: PostSource>(
    source: &S,
    urls: &[String],
    limit: usize,
) -> Vec<PostRecord> {
    let mut records = Vec::new();

    for url in urls.iter().take(limit) {
        let mut attempts = 0;
        while attempts < MAX_ATTEMPTS {
            match source.load_post(url).await {
                Ok(raw) => {
                    let record = build_record(url, raw);
                    info!("Processed URL: {}", url);
                    debug!(
                        "Content found: {}...",
                        record.content.chars().take(100).collect::<String>()
                    );
                    records.push(record);
                    break;
                }
                Err(e) if errors::is_stale_element(&e) => {
                    attempts += 1;
                    warn!("Attempt {} failed for URL {}", attempts, url);
                    if attempts < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
                Err(e) => {
                    error!("Error processing URL {}: {:#}", url, e);
                    break;
                }
            }
        }
    }

    records
}

/// Normalize a raw capture into a record.
fn build_record(url: &str, raw: RawPost) -> PostRecord {
    let content = match raw.primary.or(raw.alternate) {
        Some(text) => clean_text(&text),
        None => CONTENT_UNAVAILABLE.to_string(),
    };

    let reactions = raw
        .reactions
        .as_deref()
        .and_then(extract_reaction_count)
        .unwrap_or_else(|| REACTIONS_UNAVAILABLE.to_string());

    // The first span is the post body, not a comment
    let comments: Vec<String> = raw
        .comments
        .iter()
        .skip(1)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect();

    let hashtags = extract_hashtags(&content);

    PostRecord {
        author: author_from_url(url),
        content,
        reactions,
        comments,
        hashtags,
        url: url.to_string(),
    }
}

/// Strip site chrome and collapse echoed lines. Idempotent.
pub fn clean_text(text: &str) -> String {
    let text = META_FOOTER.replace_all(text, "");
    let text = CONVERSATION_PROMPT.replace_all(&text, "");
    let collapsed: Vec<String> = text.lines().map(collapse_echo_line).collect();
    collapsed.join("\n").trim().to_string()
}

/// Collapse a `prefix; •; prefix...` line to `prefix...`.
///
/// Runs to a fixed point so that nested echoes (`x; •; x; •; x`) reduce
/// fully and the cleanup stays idempotent.
fn collapse_echo_line(line: &str) -> String {
    const SEPARATOR: &str = "; \u{2022}; ";

    let mut current = line.to_string();
    'collapse: loop {
        let mut search_from = 0;
        while let Some(pos) = current[search_from..].find(SEPARATOR) {
            let at = search_from + pos;
            let prefix = &current[..at];
            let rest = &current[at + SEPARATOR.len()..];
            if rest.starts_with(prefix) {
                current = rest.to_string();
                continue 'collapse;
            }
            search_from = at + SEPARATOR.len();
        }
        break;
    }
    current
}

/// Hashtags in order of first appearance, duplicates kept.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// First numeric-looking token of the reactions element text.
fn extract_reaction_count(text: &str) -> Option<String> {
    REACTION_COUNT.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
#[path = "scraper_test.rs"]
mod scraper_test;
