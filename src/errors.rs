use std::fmt;

/// Custom error type that includes exit codes
#[derive(Debug)]
pub enum ScrapeError {
    /// Login could not be completed (exit code 2)
    LoginFailed(String),
    /// WebDriver connection failed (exit code 4)
    WebDriverFailed(String),
    /// Operation timeout (exit code 5)
    Timeout(String),
    /// Generic error (exit code 1)
    Other(anyhow::Error),
}

impl ScrapeError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ScrapeError::LoginFailed(_) => 2,
            ScrapeError::WebDriverFailed(_) => 4,
            ScrapeError::Timeout(_) => 5,
            ScrapeError::Other(_) => 1,
        }
    }
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::LoginFailed(msg) => {
                write!(f, "Login failed: {}", msg)
            }
            ScrapeError::WebDriverFailed(msg) => {
                write!(f, "WebDriver connection failed: {}", msg)
            }
            ScrapeError::Timeout(msg) => {
                write!(f, "Operation timed out: {}", msg)
            }
            ScrapeError::Other(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScrapeError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        // Try to detect specific error types from the error message
        let msg = format!("{:#}", err);

        if msg.contains("login") || msg.contains("Login") {
            ScrapeError::LoginFailed(msg)
        } else if msg.contains("WebDriver")
            || msg.contains("geckodriver")
            || msg.contains("chromedriver")
        {
            ScrapeError::WebDriverFailed(msg)
        } else if msg.contains("timeout") || msg.contains("timed out") {
            ScrapeError::Timeout(msg)
        } else {
            ScrapeError::Other(err)
        }
    }
}

/// Whether an error is a stale element reference fault.
///
/// The WebDriver protocol names this error "stale element reference" and
/// fantoccini carries the message through, so the retry loop classifies by
/// substring.
pub fn is_stale_element(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("stale element reference"))
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
