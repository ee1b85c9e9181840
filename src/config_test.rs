use crate::config::*;
use secrecy::ExposeSecret;
use serial_test::serial;

fn clear_env() {
    // SAFETY: tests touching the environment are serialized.
    unsafe {
        for key in [
            ENV_API_KEY,
            ENV_BASE_URL,
            ENV_LOCATION_ID,
            ENV_COMPANY_ID,
            ENV_API_VERSION,
        ] {
            std::env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_missing_api_key_is_an_error() {
    clear_env();
    let err = Config::resolve(ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey));
}

#[test]
#[serial]
fn test_defaults_apply_when_only_key_given() {
    clear_env();
    let config = Config::resolve(ConfigOverrides {
        api_key: Some("pit-123".to_string()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.api_key.expose_secret(), "pit-123");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api_version, DEFAULT_API_VERSION);
    assert_eq!(config.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
    assert!(config.location_id.is_none());
}

#[test]
#[serial]
fn test_environment_fills_missing_overrides() {
    clear_env();
    unsafe {
        std::env::set_var(ENV_API_KEY, "env-key");
        std::env::set_var(ENV_LOCATION_ID, "loc-env");
        std::env::set_var(ENV_BASE_URL, "http://localhost:9000/");
    }

    let config = Config::resolve(ConfigOverrides::default()).unwrap();
    assert_eq!(config.api_key.expose_secret(), "env-key");
    assert_eq!(config.location_id.as_deref(), Some("loc-env"));
    assert_eq!(config.base_url, "http://localhost:9000");
    clear_env();
}

#[test]
#[serial]
fn test_explicit_overrides_win_over_environment() {
    clear_env();
    unsafe {
        std::env::set_var(ENV_LOCATION_ID, "loc-env");
    }

    let config = Config::resolve(ConfigOverrides {
        api_key: Some("flag-key".to_string()),
        location_id: Some("loc-flag".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(config.location_id.as_deref(), Some("loc-flag"));
    clear_env();
}

#[test]
#[serial]
fn test_blank_environment_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var(ENV_API_KEY, "   ");
    }
    assert!(Config::resolve(ConfigOverrides::default()).is_err());
    clear_env();
}

#[test]
#[serial]
fn test_non_http_base_url_is_rejected() {
    clear_env();
    let err = Config::resolve(ConfigOverrides {
        api_key: Some("k".to_string()),
        base_url: Some("ftp://example.com".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
}
