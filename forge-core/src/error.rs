#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// The model id is not in the static model table.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The model is known but its provider family failed to initialise.
    #[error("Provider '{family}' unavailable: {reason}")]
    ProviderUnavailable { family: String, reason: String },

    /// Network or vendor failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Response could not be parsed as structured data.
    #[error("Format error: {0}")]
    Format(String),

    /// Structured data parsed but failed a schema or structural check.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ForgeError {
    /// Whether a caller that owns a retry budget may try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Format(_) | Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForgeError::UnknownModel("not-a-real-model".to_string());
        assert_eq!(err.to_string(), "Unknown model: not-a-real-model");

        let err = ForgeError::ProviderUnavailable {
            family: "anthropic".to_string(),
            reason: "missing api key".to_string(),
        };
        assert_eq!(err.to_string(), "Provider 'anthropic' unavailable: missing api key");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ForgeError::Provider("HTTP 503".into()).is_retryable());
        assert!(ForgeError::Format("not json".into()).is_retryable());
        assert!(ForgeError::Validation("files is empty".into()).is_retryable());
        assert!(!ForgeError::UnknownModel("x".into()).is_retryable());
        assert!(!ForgeError::Config("x".into()).is_retryable());
        assert!(!ForgeError::Persistence("x".into()).is_retryable());
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ForgeError = serde_err.into();
        assert!(matches!(err, ForgeError::Serde(_)));
    }
}
