//! Error types for Prioritas

/// Result type alias using Prioritas' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Prioritas operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A complaint record is malformed or missing a required field
    #[error("invalid complaint '{id}': {reason}")]
    InvalidComplaint { id: String, reason: String },

    /// The labelled batch is too small for a meaningful estimate
    #[error("insufficient data: {actual} labelled records, at least {required} required")]
    InsufficientData { required: usize, actual: usize },

    /// Inference attempted against a model with no usable features or no training mass
    #[error("untrained model: {0}")]
    UntrainedModel(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new invalid complaint error
    pub fn invalid_complaint(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComplaint {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a new insufficient data error
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Create a new untrained model error
    pub fn untrained(msg: impl Into<String>) -> Self {
        Self::UntrainedModel(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = Error::insufficient_data(10, 9);
        assert_eq!(
            err.to_string(),
            "insufficient data: 9 labelled records, at least 10 required"
        );

        let err = Error::invalid_complaint("c-7", "missing category");
        assert_eq!(err.to_string(), "invalid complaint 'c-7': missing category");
    }
}
