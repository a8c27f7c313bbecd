//! Error types for configuration loading and validation.

/// Failures while loading an `mvnet.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read mvnet.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The content is not valid TOML or does not match the schema.
    #[error("malformed mvnet.toml: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    ValidationError {
        /// Dotted path of the offending key.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        ConfigError::ValidationError {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
