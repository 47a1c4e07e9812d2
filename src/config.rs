use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::webdriver::BrowserType;

/// Run configuration, resolved once at startup.
///
/// Every field can come from the environment; CLI flags take precedence
/// where both are given.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the WebDriver binary; `None` means look it up on PATH
    pub driver_path: Option<PathBuf>,
    /// Instagram account username
    pub username: String,
    /// Instagram account password
    pub password: String,
    /// Hashtag to search for
    pub hashtag: String,
    /// Browser to drive
    pub browser: BrowserType,
}

impl Config {
    /// Resolve configuration from CLI overrides plus the environment.
    ///
    /// Environment variables: `DRIVER_PATH`, `INSTAGRAM_USERNAME`,
    /// `INSTAGRAM_PASSWORD`, `INSTAGRAM_HASHTAG`, `BROWSER`.
    pub fn resolve(hashtag: Option<String>, browser: Option<String>) -> Result<Self> {
        let driver_path = std::env::var("DRIVER_PATH").ok().map(PathBuf::from);

        let username = std::env::var("INSTAGRAM_USERNAME")
            .context("INSTAGRAM_USERNAME is not set")?;
        let password = std::env::var("INSTAGRAM_PASSWORD")
            .context("INSTAGRAM_PASSWORD is not set")?;

        let hashtag = match hashtag {
            Some(tag) => tag,
            None => std::env::var("INSTAGRAM_HASHTAG")
                .context("No hashtag given: set INSTAGRAM_HASHTAG or pass --hashtag")?,
        };

        let browser = match browser {
            Some(name) => name,
            None => std::env::var("BROWSER").unwrap_or_else(|_| "firefox".to_string()),
        }
        .parse::<BrowserType>()?;

        Ok(Config {
            driver_path,
            username,
            password,
            hashtag,
            browser,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
