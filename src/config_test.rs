// Unit tests for configuration resolution
//
// All environment mutation happens inside one test function so parallel
// test threads never race on the variables.

use pretty_assertions::assert_eq;

use super::*;
use crate::webdriver::BrowserType;

#[test]
fn test_resolve_from_env_and_overrides() {
    std::env::set_var("INSTAGRAM_USERNAME", "someuser");
    std::env::set_var("INSTAGRAM_PASSWORD", "hunter2");
    std::env::set_var("INSTAGRAM_HASHTAG", "envtag");
    std::env::remove_var("BROWSER");
    std::env::remove_var("DRIVER_PATH");

    // Env-only resolution, browser defaults to firefox
    let config = Config::resolve(None, None).unwrap();
    assert_eq!(config.username, "someuser");
    assert_eq!(config.password, "hunter2");
    assert_eq!(config.hashtag, "envtag");
    assert_eq!(config.browser, BrowserType::Firefox);
    assert!(config.driver_path.is_none());

    // CLI flags take precedence over the environment
    let config = Config::resolve(Some("clitag".to_string()), Some("chrome".to_string())).unwrap();
    assert_eq!(config.hashtag, "clitag");
    assert_eq!(config.browser, BrowserType::Chrome);

    // BROWSER env is picked up when no flag is given
    std::env::set_var("BROWSER", "chrome");
    let config = Config::resolve(None, None).unwrap();
    assert_eq!(config.browser, BrowserType::Chrome);

    // DRIVER_PATH is optional but honoured
    std::env::set_var("DRIVER_PATH", "/opt/chromedriver");
    let config = Config::resolve(None, None).unwrap();
    assert_eq!(
        config.driver_path.as_deref(),
        Some(std::path::Path::new("/opt/chromedriver"))
    );

    // Unsupported browser names fail explicitly
    assert!(Config::resolve(None, Some("edge".to_string())).is_err());

    // Missing credentials fail before any browser is started
    std::env::remove_var("INSTAGRAM_USERNAME");
    assert!(Config::resolve(None, None).is_err());
    std::env::set_var("INSTAGRAM_USERNAME", "someuser");

    // Missing hashtag with no flag fails
    std::env::remove_var("INSTAGRAM_HASHTAG");
    assert!(Config::resolve(None, None).is_err());
}

#[test]
fn test_browser_type_parsing() {
    assert_eq!("firefox".parse::<BrowserType>().unwrap(), BrowserType::Firefox);
    assert_eq!("Chrome".parse::<BrowserType>().unwrap(), BrowserType::Chrome);
    assert_eq!("chromium".parse::<BrowserType>().unwrap(), BrowserType::Chrome);
    assert!("edge".parse::<BrowserType>().is_err());
    assert!("".parse::<BrowserType>().is_err());
}
