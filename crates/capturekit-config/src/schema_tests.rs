use super::*;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.history_page_size, 5);
    assert_eq!(config.debugger.endpoint, "http://localhost:9222");
    assert_eq!(config.debugger.response_body_limit, 2000);
    assert_eq!(config.state.recent_repos_limit, 3);
    assert!(config.debugger.restricted_schemes.iter().any(|s| s == "chrome://"));
}

#[test]
fn test_partial_section_keeps_defaults() {
    let config: Config = toml::from_str(
        r#"
        [debugger]
        endpoint = "http://127.0.0.1:9333"
        "#,
    )
    .unwrap();
    assert_eq!(config.debugger.endpoint, "http://127.0.0.1:9333");
    assert_eq!(config.debugger.response_body_limit, 2000);
    assert_eq!(config.api.base_url, "https://jules.googleapis.com/v1alpha");
}

#[test]
fn test_state_dir_expanded() {
    let config = StateConfig::default();
    let dir = config.dir_path();
    assert!(!dir.to_string_lossy().starts_with('~'));
    assert!(dir.ends_with(".capturekit"));
}

#[test]
fn test_default_config_path() {
    assert!(default_config_path().ends_with("config.toml"));
}
