/*!
 * Tests for application configuration functionality
 */

use scriptripper::app_config::{Config, LogLevel};
use tokio_test::{assert_err, assert_ok};

use crate::common::{config_path, create_temp_dir};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.default_language, "en");
    assert_eq!(config.server.listen_address(), "127.0.0.1:3080");
    assert_eq!(config.upstream.timedtext_url, "https://www.youtube.com/api/timedtext");
    assert_eq!(config.upstream.proxy_url, "https://youtubetranscript.com/");
    assert_eq!(config.http.accept_language, "en-US,en;q=0.9");
    assert_eq!(config.http.referer, "https://www.youtube.com/");
    assert!(config.http.user_agent.contains("Chrome/120.0.0.0"));
    assert_eq!(config.timeouts.library_secs, 20);
    assert_eq!(config.timeouts.proxy_secs, 20);
    assert_eq!(config.timeouts.pipeline_secs, 90);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert_ok!(config.validate());

    config.default_language = "  ".to_string();
    assert!(config.validate().is_err());
    config.default_language = "en".to_string();

    config.upstream.proxy_url = "not a url".to_string();
    assert!(config.validate().is_err());
    config.upstream.proxy_url = "https://youtubetranscript.com/".to_string();

    config.timeouts.pipeline_secs = 0;
    assert!(config.validate().is_err());
    config.timeouts.pipeline_secs = 90;

    config.http.request_timeout_secs = 0;
    assert_err!(config.validate());
}

#[test]
fn test_loadOrCreate_missingFile_shouldWriteDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = config_path(&dir);
    let path_str = path.to_str().unwrap();

    let config = Config::load_or_create(path_str).unwrap();
    assert!(path.exists());
    assert_eq!(config.server.port, 3080);

    let reloaded = Config::load_or_create(path_str).unwrap();
    assert_eq!(reloaded.timeouts, config.timeouts);
}

#[test]
fn test_loadOrCreate_partialFile_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = config_path(&dir);
    std::fs::write(&path, r#"{"default_language":"de","server":{"port":9000},"log_level":"debug"}"#).unwrap();

    let config = Config::load_or_create(path.to_str().unwrap()).unwrap();
    assert_eq!(config.default_language, "de");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.timeouts.proxy_secs, 20);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_invalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = config_path(&dir);
    std::fs::write(&path, "{ not json").unwrap();

    let error = Config::load_or_create(path.to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", error).contains("Failed to parse config file"));
}
