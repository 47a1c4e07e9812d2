use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::webdriver::BrowserType;

/// Manages the WebDriver process (geckodriver or chromedriver)
pub struct WebDriverManager {
    process: Mutex<Option<DriverProcess>>,
}

struct DriverProcess {
    child: Child,
    port: u16,
    url: String,
}

impl Default for WebDriverManager {
    fn default() -> Self {
        Self {
            process: Mutex::new(None),
        }
    }
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a WebDriver is running for the given browser type.
    /// Returns the URL to connect to.
    ///
    /// `driver_path` overrides the PATH lookup of the driver binary.
    pub async fn ensure_driver(
        &self,
        browser_type: &BrowserType,
        driver_path: Option<&Path>,
    ) -> Result<String> {
        // Reuse the managed driver if it is still responding
        let managed_url = {
            let process = self.process.lock().unwrap();
            process.as_ref().map(|p| p.url.clone())
        };
        if let Some(url) = managed_url {
            if Self::verify_driver_working(&url).await {
                debug!("Using existing managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        // Check the standard port for an externally managed driver
        let standard_url = match browser_type {
            BrowserType::Firefox => "http://localhost:4444",
            BrowserType::Chrome => "http://localhost:9515",
        };
        if Self::is_driver_running(standard_url).await
            && Self::verify_driver_working(standard_url).await
        {
            debug!("Found external WebDriver at {}", standard_url);
            return Ok(standard_url.to_string());
        }

        info!("WebDriver not detected, attempting to start automatically...");
        self.start_driver(browser_type, driver_path).await
    }

    /// Start a WebDriver process
    async fn start_driver(
        &self,
        browser_type: &BrowserType,
        driver_path: Option<&Path>,
    ) -> Result<String> {
        let default_command = browser_type.driver_name();
        let port = Self::find_free_port_for_browser(browser_type)?;

        let (command, args) = match driver_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "WebDriver binary not found at {} (DRIVER_PATH)",
                        path.display()
                    );
                }
                (path.as_os_str().to_owned(), Self::port_args(browser_type, port))
            }
            None => {
                if !Self::command_exists(default_command) {
                    anyhow::bail!(
                        "{} not found in PATH. Please install it:\n\
                          macOS: brew install {}\n\
                          Linux: Download from official releases\n\
                        Or point DRIVER_PATH at the binary.",
                        default_command,
                        default_command
                    );
                }
                (
                    std::ffi::OsString::from(default_command),
                    Self::port_args(browser_type, port),
                )
            }
        };

        info!("Starting {} on port {}", default_command, port);
        let child = Command::new(&command)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context(format!("Failed to start {}", default_command))?;

        let url = format!("http://localhost:{}", port);
        {
            let mut process = self.process.lock().unwrap();
            // A previous driver that stopped responding gets replaced
            if let Some(mut old) = process.take() {
                let _ = old.child.kill();
            }
            *process = Some(DriverProcess {
                child,
                port,
                url: url.clone(),
            });
        }

        // Wait for the driver to be ready (with timeout)
        let max_attempts = 30; // 3 seconds total
        for attempt in 1..=max_attempts {
            if Self::is_driver_running(&url).await {
                info!("WebDriver started successfully on port {}", port);
                return Ok(url);
            }
            if attempt < max_attempts {
                sleep(Duration::from_millis(100)).await;
            }
        }

        self.stop_all();
        anyhow::bail!("WebDriver failed to start within timeout")
    }

    fn port_args(browser_type: &BrowserType, port: u16) -> Vec<String> {
        match browser_type {
            BrowserType::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserType::Chrome => vec![format!("--port={}", port)],
        }
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        {
            Command::new("which")
                .arg(command)
                .output()
                .map(|output| output.status.success())
                .unwrap_or(false)
        }

        #[cfg(windows)]
        {
            Command::new("where")
                .arg(command)
                .output()
                .map(|output| output.status.success())
                .unwrap_or(false)
        }
    }

    /// Find a free port to use
    pub fn find_free_port_for_browser(browser_type: &BrowserType) -> Result<u16> {
        // Try browser-specific ports first to avoid conflicts
        let preferred_ports = match browser_type {
            BrowserType::Firefox => vec![4444, 4445, 4446],
            BrowserType::Chrome => vec![9515, 9516, 9517],
        };

        for port in preferred_ports {
            if !Self::is_port_in_use(port) {
                debug!("Found free port {} for {:?}", port, browser_type);
                return Ok(port);
            }
        }

        // Fall back to letting the OS assign a port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    /// Check if a port is in use
    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Check if WebDriver is running at the given URL
    pub async fn is_driver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Verify that WebDriver is actually working (not just running)
    async fn verify_driver_working(url: &str) -> bool {
        // A working driver reports ready:true on its status endpoint
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => {
                if let Ok(body) = response.json::<serde_json::Value>().await {
                    body.get("value")
                        .and_then(|v| v.get("ready"))
                        .and_then(|r| r.as_bool())
                        .unwrap_or(false)
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Stop the managed WebDriver process
    pub fn stop_all(&self) {
        let mut process = self.process.lock().unwrap();
        if let Some(mut driver) = process.take() {
            debug!("Stopping WebDriver on port {}", driver.port);
            let _ = driver.child.kill();
            let _ = driver.child.wait();
        }
    }
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        // Clean up the process we started
        self.stop_all();
    }
}

// Global WebDriver manager instance
lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
