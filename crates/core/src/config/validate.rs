use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Remote service credentials are present
/// - Stylesheet path is set
/// - Polling deadline is nonzero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.htr.username.is_empty() || config.htr.password.is_empty() {
        return Err(ConfigError::ValidationError(
            "htr.username and htr.password must be set".to_string(),
        ));
    }

    if config.pipeline.stylesheet.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.stylesheet must be set".to_string(),
        ));
    }

    if config.pipeline.poll_deadline_secs == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.poll_deadline_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[htr]
username = "reader"
password = "secret"

[pipeline]
stylesheet = "alto2hocr.sef.json"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_missing_credentials_fails() {
        let mut config = valid_config();
        config.htr.password = String::new();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_deadline_fails() {
        let mut config = valid_config();
        config.pipeline.poll_deadline_secs = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
