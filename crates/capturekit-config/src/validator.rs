//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_api(config, &mut result);
        Self::validate_debugger(config, &mut result);
        Self::validate_state(config, &mut result);

        result
    }

    fn validate_api(config: &Config, result: &mut ValidationResult) {
        if config.api.base_url.trim().is_empty() {
            result.add_error(ValidationError::new("api.base_url", "Base URL cannot be empty"));
        } else if url::Url::parse(&config.api.base_url).is_err() {
            result.add_error(ValidationError::new(
                "api.base_url",
                format!("Not a valid URL: {}", config.api.base_url),
            ));
        }

        if config.api.history_page_size == 0 {
            result.add_error(ValidationError::new(
                "api.history_page_size",
                "History page size must be at least 1",
            ));
        }

        if config.api.timeout_seconds == 0 {
            result.add_warning(ValidationWarning::new(
                "api.timeout_seconds",
                "A zero timeout disables the request timeout",
            ));
        }
    }

    fn validate_debugger(config: &Config, result: &mut ValidationResult) {
        if config.debugger.response_body_limit == 0 {
            result.add_error(ValidationError::new(
                "debugger.response_body_limit",
                "Response body limit must be at least 1",
            ));
        }

        if config.debugger.restricted_schemes.is_empty() {
            result.add_warning(ValidationWarning::new(
                "debugger.restricted_schemes",
                "No restricted schemes; the debugger may try to attach to browser pages",
            ));
        }
    }

    fn validate_state(config: &Config, result: &mut ValidationResult) {
        if config.state.recent_repos_limit == 0 {
            result.add_error(ValidationError::new(
                "state.recent_repos_limit",
                "Recent repository limit must be at least 1",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
