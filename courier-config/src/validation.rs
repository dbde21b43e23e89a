// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not blank
    pub fn not_blank(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(field, "must not be blank"));
        }
        Ok(())
    }

    /// Validate that a number is at least `min`
    pub fn at_least<T: PartialOrd + std::fmt::Display>(value: T, min: T, field: &str) -> Result<()> {
        if value < min {
            return Err(ConfigError::invalid(
                field,
                format!("must be at least {}, got {}", min, value),
            ));
        }
        Ok(())
    }

    /// Validate that a value looks like an http(s) URL
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        let value = value.trim();
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ConfigError::invalid(
                field,
                format!("`{}` must be an http or https URL", value),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank_validation() {
        assert!(ConfigValidator::not_blank("value", "field").is_ok());
        assert!(ConfigValidator::not_blank("  ", "field").is_err());
    }

    #[test]
    fn test_at_least_validation() {
        assert!(ConfigValidator::at_least(1, 1, "field").is_ok());
        let err = ConfigValidator::at_least(0, 1, "scheduler.core-pool-size").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for `scheduler.core-pool-size`: must be at least 1, got 0"
        );
    }

    #[test]
    fn test_url_validation() {
        assert!(ConfigValidator::is_url("https://example.com", "field").is_ok());
        assert!(ConfigValidator::is_url(" http://example.com", "field").is_ok());
        assert!(ConfigValidator::is_url("example.com", "field").is_err());
    }
}
