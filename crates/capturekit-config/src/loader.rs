//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when it is missing.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex");

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.capturekit`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.api.history_page_size, 5);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [api]
            base_url = "http://localhost:8000/v1"
            history_page_size = 10

            [debugger]
            restricted_schemes = ["chrome://"]
            response_body_limit = 500

            [state]
            dir = "/tmp/capturekit"
            recent_repos_limit = 5

            [notifications]
            error_dedup_ms = 0
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/v1");
        assert_eq!(config.api.history_page_size, 10);
        assert_eq!(config.debugger.restricted_schemes, vec!["chrome://".to_string()]);
        assert_eq!(config.debugger.response_body_limit, 500);
        assert_eq!(config.state.recent_repos_limit, 5);
        assert_eq!(config.notifications.error_dedup_ms, 0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[debugger]").unwrap();
        writeln!(file, "endpoint = \"http://127.0.0.1:9444\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.debugger.endpoint, "http://127.0.0.1:9444");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.state.recent_repos_limit, 3);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable name, not read anywhere else
        unsafe {
            std::env::set_var("CAPTUREKIT_TEST_BASE", "http://mock.local");
        }
        let content = "[api]\nbase_url = \"${CAPTUREKIT_TEST_BASE}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.api.base_url, "http://mock.local");
        unsafe {
            std::env::remove_var("CAPTUREKIT_TEST_BASE");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${CAPTUREKIT_MISSING_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }
}
