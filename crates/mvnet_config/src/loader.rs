//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EngineConfig;
use std::path::Path;

/// Loads and validates an `mvnet.toml` configuration from a directory.
///
/// Reads `<dir>/mvnet.toml`, parses it, and validates its values.
pub fn load_config(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let config_path = dir.join("mvnet.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `mvnet.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are in range.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.network.name.is_empty() {
        return Err(ConfigError::MissingField("network.name".to_string()));
    }
    if config.network.max_nodes == 0 {
        return Err(ConfigError::invalid("network.max_nodes", "must be positive"));
    }
    if config.global.timeout_ms == Some(0) {
        return Err(ConfigError::invalid("global.timeout_ms", "must be positive when set"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InputOrder;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[network]
name = "alu"
max_nodes = 5000

[global]
reorder = true
timeout_ms = 2500
from_latches_only = true
drop_intermediate = false
input_order = "natural"

[passes]
sweep = false
minimum_base = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.network.name, "alu");
        assert_eq!(config.network.max_nodes, 5000);
        assert!(config.global.reorder);
        assert_eq!(config.global.timeout_ms, Some(2500));
        assert!(config.global.from_latches_only);
        assert!(!config.global.drop_intermediate);
        assert_eq!(config.global.input_order, InputOrder::Natural);
        assert!(!config.passes.sweep);
    }

    #[test]
    fn empty_name_errors() {
        let toml = r#"
[network]
name = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn zero_capacity_errors() {
        let toml = r#"
[network]
max_nodes = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn zero_timeout_errors() {
        let toml = r#"
[global]
timeout_ms = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn invalid_toml_errors() {
        let toml = "this is not valid toml {{{}}}";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
