use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration failures. Any of these aborts widget construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("options JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("options must be a JSON object")]
    NotAnObject,

    #[error("option `url` is required")]
    MissingUrl,

    #[error("option `url` must be an http(s) or root-relative address: {url}")]
    InvalidUrl { url: String },

    #[error("invalid exclude path {pattern:?}: {reason}")]
    InvalidExcludePath { pattern: String, reason: String },

    #[error("invalid value for option `{field}`: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl ConfigError {
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Non-fatal findings reported while reading options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("unknown option `{key}` ignored")]
    UnknownKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_constructor_names_the_field() {
        let error = ConfigError::invalid("inactivityTimeout", "must be > 0");
        assert_eq!(
            error.to_string(),
            "invalid value for option `inactivityTimeout`: must be > 0"
        );
    }

    #[test]
    fn unknown_key_warning_is_descriptive() {
        let warning = ConfigWarning::UnknownKey {
            key: "buttonColour".into(),
        };
        assert_eq!(warning.to_string(), "unknown option `buttonColour` ignored");
    }
}
