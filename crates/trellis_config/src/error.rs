//! Errors from reading, parsing and checking `trellis.toml`.

/// Why a configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read trellis.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the expected shape.
    #[error("invalid trellis.toml: {0}")]
    ParseError(String),

    /// No `[layouts.<name>]` table exists for the requested name.
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    /// A field that must be set is empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Fields are present but their values are unusable together.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            ConfigError::UnknownLayout("checkout".into()).to_string(),
            "unknown layout 'checkout'"
        );
        assert_eq!(
            ConfigError::MissingField("layouts.home.source".into()).to_string(),
            "missing required field: layouts.home.source"
        );
        assert_eq!(
            ConfigError::ValidationError("fast tier is empty".into()).to_string(),
            "invalid configuration: fast tier is empty"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: ConfigError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert!(err.to_string().starts_with("cannot read trellis.toml:"));
    }
}
