use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_empty_base_url() {
    let mut config = Config::default();
    config.api.base_url = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "api.base_url"));
}

#[test]
fn test_validate_malformed_base_url() {
    let mut config = Config::default();
    config.api.base_url = "not a url".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "api.base_url"));
}

#[test]
fn test_validate_zero_limits() {
    let mut config = Config::default();
    config.debugger.response_body_limit = 0;
    config.state.recent_repos_limit = 0;
    config.api.history_page_size = 0;

    let result = ConfigValidator::validate(&config);
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_validate_warnings_keep_config_valid() {
    let mut config = Config::default();
    config.debugger.restricted_schemes.clear();
    config.api.timeout_seconds = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("state.dir", "missing");
    assert_eq!(err.to_string(), "state.dir: missing");
}
